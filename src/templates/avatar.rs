use crate::{rng::unit_hash, surface::Surface};

const SKIN: [u8; 4] = [232, 190, 160, 255];
const SKIN_SHADOW: [u8; 4] = [205, 160, 130, 255];
const HAIR: [u8; 4] = [58, 40, 30, 255];
const SHIRT: [u8; 4] = [46, 80, 120, 255];
const EYE: [u8; 4] = [40, 32, 30, 255];
const MOUTH: [u8; 4] = [120, 50, 50, 255];

/// Animation state for one frame, pure in `(t, seed, speaking)`.
#[derive(Clone, Copy, Debug)]
pub struct AvatarPose {
    /// Vertical breathing offset in `[-1, 1]`.
    pub breath: f64,
    /// Eyelid openness in `[0, 1]`; 0 is fully closed.
    pub eye_open: f64,
    /// Mouth-open amplitude in `[0, 1]`.
    pub mouth_open: f64,
}

impl AvatarPose {
    /// Blinks ride a fast sinusoid most of the time; roughly every few
    /// seconds a deep spike closes the eyes fully. Mouth movement is a
    /// high-frequency sinusoid gated by the speaking flag, not by audio.
    pub fn at(t: f64, duration_secs: f64, seed: u64, speaking: bool) -> Self {
        let secs = t * duration_secs;
        let breath = (secs * 2.0 * std::f64::consts::PI / 3.4).sin();

        let flutter = 0.92 + 0.08 * (secs * 5.1).sin();
        let blink_period = 2.8 + unit_hash(seed, 0) * 1.6;
        let phase = (secs / blink_period).fract();
        // Full close for a ~120ms window once per period.
        let spike_width = 0.12 / blink_period;
        let eye_open = if phase < spike_width {
            let p = phase / spike_width;
            (2.0 * (p - 0.5)).abs()
        } else {
            flutter
        };

        let mouth_open = if speaking {
            let osc = (secs * 2.0 * std::f64::consts::PI * 7.5).sin().abs();
            0.25 + 0.75 * osc
        } else {
            0.0
        };

        Self {
            breath,
            eye_open: eye_open.clamp(0.0, 1.0),
            mouth_open,
        }
    }
}

/// Draws a procedural presenter bust centered in the lower half of the frame.
pub fn draw_avatar(surface: &mut Surface, t: f64, duration_secs: f64, seed: u64, speaking: bool) {
    let pose = AvatarPose::at(t, duration_secs, seed, speaking);

    let w = f64::from(surface.width);
    let h = f64::from(surface.height);
    let cx = w * 0.5;
    let unit = w.min(h) * 0.001;
    let bob = pose.breath * 4.0 * unit;

    let head_cy = h * 0.62 + bob;
    let head_r = 110.0 * unit;

    // Shoulders and shirt.
    surface.fill_ellipse(
        cx,
        h * 0.62 + head_r * 1.9 + bob * 0.5,
        head_r * 2.1,
        head_r * 1.3,
        SHIRT,
        1.0,
    );

    // Head with a simple hair cap.
    surface.fill_circle(cx, head_cy, head_r, SKIN, 1.0);
    surface.fill_ellipse(
        cx,
        head_cy - head_r * 0.55,
        head_r * 1.02,
        head_r * 0.62,
        HAIR,
        1.0,
    );
    surface.fill_ellipse(
        cx,
        head_cy + head_r * 0.35,
        head_r * 0.55,
        head_r * 0.28,
        SKIN_SHADOW,
        0.6,
    );

    // Eyes squash vertically with eyelid openness.
    let eye_dx = head_r * 0.38;
    let eye_cy = head_cy - head_r * 0.08;
    let eye_rx = head_r * 0.13;
    let eye_ry = (head_r * 0.16 * pose.eye_open).max(head_r * 0.015);
    surface.fill_ellipse(cx - eye_dx, eye_cy, eye_rx, eye_ry, EYE, 1.0);
    surface.fill_ellipse(cx + eye_dx, eye_cy, eye_rx, eye_ry, EYE, 1.0);

    // Mouth opens into an ellipse while speaking, a thin line at rest.
    let mouth_cy = head_cy + head_r * 0.48;
    let mouth_rx = head_r * 0.30;
    let mouth_ry = head_r * (0.035 + 0.22 * pose.mouth_open);
    surface.fill_ellipse(cx, mouth_cy, mouth_rx, mouth_ry, MOUTH, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouth_closed_when_silent() {
        for i in 0..50 {
            let t = i as f64 / 50.0;
            let pose = AvatarPose::at(t, 30.0, 7, false);
            assert_eq!(pose.mouth_open, 0.0);
        }
    }

    #[test]
    fn mouth_moves_while_speaking() {
        let a = AvatarPose::at(0.300, 30.0, 7, true);
        let b = AvatarPose::at(0.312, 30.0, 7, true);
        assert!(a.mouth_open > 0.0);
        assert!((a.mouth_open - b.mouth_open).abs() > 1e-3);
    }

    #[test]
    fn pose_is_deterministic_in_t_and_seed() {
        let a = AvatarPose::at(0.4217, 30.0, 99, true);
        let b = AvatarPose::at(0.4217, 30.0, 99, true);
        assert_eq!(a.breath, b.breath);
        assert_eq!(a.eye_open, b.eye_open);
        assert_eq!(a.mouth_open, b.mouth_open);
    }

    #[test]
    fn eyes_fully_close_at_blink_spike() {
        // Sample densely over a full period; somewhere the spike must dip
        // close to zero.
        let mut min_open = f64::MAX;
        for i in 0..4000 {
            let t = i as f64 / 4000.0;
            min_open = min_open.min(AvatarPose::at(t, 30.0, 3, false).eye_open);
        }
        assert!(min_open < 0.05, "min eye_open was {min_open}");
    }

    #[test]
    fn drawing_touches_pixels() {
        let mut surface = Surface::new(200, 360);
        surface.clear([0, 0, 0, 255]);
        draw_avatar(&mut surface, 0.5, 30.0, 1, true);
        let changed = surface
            .data
            .chunks_exact(4)
            .filter(|px| px[0] != 0 || px[1] != 0 || px[2] != 0)
            .count();
        assert!(changed > 500);
    }
}
