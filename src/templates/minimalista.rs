use crate::{
    effects,
    rng::derive_seed,
    surface::{CoverBlit, Surface},
    text::FontBank,
};

use super::{Template, TemplateCtx, TextLayout, draw_standard_text, ease_out_cubic, slideshow_slot};

const TRANSITION_WINDOW: f64 = 0.15;
const ACCENT: [u8; 4] = [255, 255, 255, 255];

/// Cinematic letterboxed frame; cuts are hard zooms, never crossfades.
pub struct Minimalista;

impl Template for Minimalista {
    fn id(&self) -> &'static str {
        "minimalista"
    }

    fn render(&self, surface: &mut Surface, fonts: &mut FontBank, t: f64, ctx: &TemplateCtx<'_>) {
        surface.clear([8, 8, 8, 255]);

        if let Some(slot) = slideshow_slot(t, ctx.images.len(), TRANSITION_WINDOW) {
            // Hard cut: only the incoming image is drawn, punching in from a
            // tighter crop.
            let zoom = if slot.mix < 1.0 {
                1.30 - 0.30 * ease_out_cubic(slot.mix)
            } else {
                1.0
            };
            surface.blit_cover(
                &ctx.images[slot.to],
                &CoverBlit {
                    zoom,
                    ..CoverBlit::default()
                },
            );
        }

        let bar = (f64::from(surface.height) * 0.09) as u32;
        surface.letterbox(bar, [0, 0, 0, 255]);
        effects::accent_sweep(
            surface,
            t,
            derive_seed(ctx.seed, "minimalista.sweep", 0),
            [255, 255, 255, 60],
        );
        draw_standard_text(surface, fonts, ctx, t, &TextLayout::default(), ACCENT);
    }
}
