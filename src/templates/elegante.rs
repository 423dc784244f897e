use crate::{
    effects,
    rng::derive_seed,
    surface::{CoverBlit, Surface},
    text::FontBank,
};

use super::{Template, TemplateCtx, TextLayout, draw_standard_text, slideshow_slot};

const TRANSITION_WINDOW: f64 = 0.17;
const ACCENT: [u8; 4] = [214, 190, 140, 255];

/// Understated vignette crossfades with a slow breathing zoom. The default
/// template.
pub struct Elegante;

impl Template for Elegante {
    fn id(&self) -> &'static str {
        "elegante"
    }

    fn render(&self, surface: &mut Surface, fonts: &mut FontBank, t: f64, ctx: &TemplateCtx<'_>) {
        surface.clear([16, 14, 12, 255]);

        if let Some(slot) = slideshow_slot(t, ctx.images.len(), TRANSITION_WINDOW) {
            let count = ctx.images.len();
            let local = (t * count as f64).fract();
            let zoom = 1.02 + 0.05 * local;

            if slot.mix < 1.0 {
                surface.blit_cover(
                    &ctx.images[slot.from],
                    &CoverBlit {
                        zoom,
                        ..CoverBlit::default()
                    },
                );
            }
            surface.blit_cover(
                &ctx.images[slot.to],
                &CoverBlit {
                    zoom,
                    alpha: slot.mix as f32,
                    ..CoverBlit::default()
                },
            );

            // The vignette deepens through the crossfade, softening the blend.
            let extra = if slot.mix < 1.0 {
                (1.0 - slot.mix) * 0.25
            } else {
                0.0
            };
            surface.vignette((0.42 + extra) as f32);
        } else {
            surface.vignette(0.42);
        }

        effects::light_leak(
            surface,
            t,
            derive_seed(ctx.seed, "elegante.leak", 0),
            [230, 200, 150, 255],
        );
        draw_standard_text(surface, fonts, ctx, t, &TextLayout::default(), ACCENT);
    }
}
