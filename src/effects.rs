use crate::{
    rng::unit_hash,
    surface::Surface,
};

/// Floating particle field. Every particle's state is a continuous function
/// of `t` and its per-element hash lane (never of frame count), so a fixed
/// seed reproduces pixels exactly.
pub fn particle_field(surface: &mut Surface, t: f64, seed: u64, count: usize, color: [u8; 4]) {
    let (w, h) = (f64::from(surface.width), f64::from(surface.height));
    for i in 0..count {
        let lane = i as u64;
        let base_x = unit_hash(seed, lane * 4);
        let base_y = unit_hash(seed, lane * 4 + 1);
        let phase = unit_hash(seed, lane * 4 + 2) * std::f64::consts::TAU;
        let size = 1.5 + unit_hash(seed, lane * 4 + 3) * 3.5;

        // Slow upward drift with a sinusoidal sway; wraps vertically.
        let y = (base_y - t * (0.12 + size * 0.03)).rem_euclid(1.0);
        let x = (base_x + 0.02 * (t * std::f64::consts::TAU * 1.7 + phase).sin()).rem_euclid(1.0);
        let twinkle = 0.5 + 0.5 * (t * std::f64::consts::TAU * 2.3 + phase).sin();

        surface.fill_circle(
            x * w,
            y * h,
            size,
            color,
            (0.25 + 0.45 * twinkle) as f32,
        );
    }
}

/// Warm light-leak blob sweeping slowly across the frame.
pub fn light_leak(surface: &mut Surface, t: f64, seed: u64, color: [u8; 4]) {
    let (w, h) = (f64::from(surface.width), f64::from(surface.height));
    let phase = unit_hash(seed, 0) * std::f64::consts::TAU;
    let cx = w * (0.5 + 0.45 * (t * std::f64::consts::TAU * 0.5 + phase).sin());
    let cy = h * (0.25 + 0.15 * (t * std::f64::consts::TAU * 0.33 + phase).cos());
    let r = w * 0.45;

    // Three nested translucent discs approximate a radial falloff.
    for (scale, alpha) in [(1.0, 0.05), (0.6, 0.07), (0.3, 0.09)] {
        surface.fill_circle(cx, cy, r * scale, color, alpha);
    }
}

/// Thin accent line sweeping horizontally once per loop.
pub fn accent_sweep(surface: &mut Surface, t: f64, seed: u64, color: [u8; 4]) {
    let w = f64::from(surface.width);
    let phase = unit_hash(seed, 0);
    let x = ((t * 0.7 + phase).rem_euclid(1.0)) * w;
    let thickness = (f64::from(surface.width) * 0.004).max(2.0) as u32;
    surface.fill_rect(
        x as i64,
        0,
        thickness,
        surface.height,
        color,
        0.35,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(seed: u64, t: f64) -> Vec<u8> {
        let mut s = Surface::new(48, 48);
        s.clear([0, 0, 0, 255]);
        particle_field(&mut s, t, seed, 12, [255, 255, 255, 255]);
        light_leak(&mut s, t, seed, [255, 180, 90, 255]);
        accent_sweep(&mut s, t, seed, [90, 200, 255, 255]);
        s.data
    }

    #[test]
    fn identical_t_and_seed_give_identical_pixels() {
        assert_eq!(rendered(5, 0.37), rendered(5, 0.37));
    }

    #[test]
    fn different_seeds_give_different_pixels() {
        assert_ne!(rendered(5, 0.37), rendered(6, 0.37));
    }

    #[test]
    fn effects_evolve_over_t() {
        assert_ne!(rendered(5, 0.1), rendered(5, 0.9));
    }
}
