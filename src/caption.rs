use crate::{
    surface::Surface,
    text::{FontBank, wrap_text},
};

const BRIGHT: [u8; 4] = [255, 214, 74, 255];
const DIM: [u8; 4] = [235, 235, 235, 160];
const BAR: [u8; 4] = [12, 12, 16, 150];

/// Words at or below this index render bright. `floor(reveal × count) + 1`,
/// capped at the word count; one word is lit from the very first frame.
pub fn revealed_count(reveal: f64, word_count: usize) -> usize {
    if word_count == 0 {
        return 0;
    }
    (((reveal.clamp(0.0, 1.0) * word_count as f64).floor() as usize) + 1).min(word_count)
}

/// Karaoke caption: translucent rounded bar, centered wrapped lines, revealed
/// words bright and the rest dim, plus a thin progress strip.
/// Non-positive `alpha` is a no-op, as is an empty font bank.
pub fn draw_caption(
    surface: &mut Surface,
    fonts: &mut FontBank,
    text: &str,
    reveal: f64,
    alpha: f32,
) {
    if alpha <= 0.0 || text.trim().is_empty() {
        return;
    }
    let font_px = (f32::from(surface.width as u16) * 0.042).clamp(22.0, 58.0);
    let max_width = surface.width as f32 * 0.82;

    let Some(painter) = fonts.painter_mut() else {
        return;
    };

    let lines = wrap_text(text, max_width, |s| painter.measure(s, font_px));
    if lines.is_empty() {
        return;
    }
    let line_h = painter.line_height(font_px);
    let pad = font_px * 0.6;
    let block_h = line_h * lines.len() as f32 + pad * 2.0;
    let block_w = lines
        .iter()
        .map(|l| painter.measure(l, font_px))
        .fold(0.0f32, f32::max)
        + pad * 2.0;

    let bar_x = (surface.width as f32 - block_w) / 2.0;
    let bar_y = surface.height as f32 * 0.86 - block_h;

    painter_independent_bar(surface, bar_x, bar_y, block_w, block_h, font_px, alpha);

    let words: Vec<&str> = text.split_whitespace().collect();
    let lit = revealed_count(reveal, words.len());

    // Re-borrow after the bar draw released the painter borrow.
    let Some(painter) = fonts.painter_mut() else {
        return;
    };
    let mut word_idx = 0usize;
    for (li, line) in lines.iter().enumerate() {
        let line_w = painter.measure(line, font_px);
        let mut x = (surface.width as f32 - line_w) / 2.0;
        let y = bar_y + pad + li as f32 * line_h;
        let space_w = painter.measure(" ", font_px);
        for word in line.split_whitespace() {
            let color = if word_idx < lit { BRIGHT } else { DIM };
            painter.draw(surface, x, y, word, font_px, color, alpha);
            x += painter.measure(word, font_px) + space_w;
            word_idx += 1;
        }
    }

    // Thin progress strip along the bottom edge of the bar.
    let strip_w = (block_w - pad * 2.0) * reveal.clamp(0.0, 1.0) as f32;
    surface.fill_rect(
        (bar_x + pad) as i64,
        (bar_y + block_h - font_px * 0.18) as i64,
        strip_w.max(0.0) as u32,
        (font_px * 0.09).max(2.0) as u32,
        BRIGHT,
        alpha,
    );
}

fn painter_independent_bar(
    surface: &mut Surface,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    font_px: f32,
    alpha: f32,
) {
    surface.fill_rounded_rect(
        x as i64,
        y as i64,
        w.max(0.0) as u32,
        h.max(0.0) as u32,
        (font_px * 0.45) as u32,
        BAR,
        alpha,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveal_is_one_word_at_progress_zero() {
        assert_eq!(revealed_count(0.0, 6), 1);
    }

    #[test]
    fn reveal_reaches_full_count_near_one() {
        assert_eq!(revealed_count(0.999, 6), 6);
        assert_eq!(revealed_count(1.0, 6), 6);
    }

    #[test]
    fn reveal_is_monotone_in_progress() {
        let mut prev = 0;
        for step in 0..=100 {
            let lit = revealed_count(step as f64 / 100.0, 9);
            assert!(lit >= prev);
            prev = lit;
        }
    }

    #[test]
    fn reveal_handles_zero_words() {
        assert_eq!(revealed_count(0.5, 0), 0);
    }

    #[test]
    fn draw_with_nonpositive_alpha_is_noop() {
        let mut surface = Surface::new(64, 64);
        surface.clear([0, 0, 0, 255]);
        let before = surface.data.clone();
        let mut fonts = FontBank::empty();
        draw_caption(&mut surface, &mut fonts, "ola mundo", 0.5, 0.0);
        draw_caption(&mut surface, &mut fonts, "ola mundo", 0.5, -1.0);
        assert_eq!(before, surface.data);
    }

    #[test]
    fn draw_without_fonts_is_noop() {
        let mut surface = Surface::new(64, 64);
        surface.clear([5, 5, 5, 255]);
        let before = surface.data.clone();
        let mut fonts = FontBank::empty();
        draw_caption(&mut surface, &mut fonts, "ola mundo", 0.5, 1.0);
        assert_eq!(before, surface.data);
    }
}
