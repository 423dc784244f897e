use crate::{
    effects,
    rng::derive_seed,
    surface::{CoverBlit, Surface},
    text::FontBank,
};

use super::{
    Template, TemplateCtx, TextLayout, TextWindow, draw_standard_text, ease_out_back,
    slideshow_slot,
};

const TRANSITION_WINDOW: f64 = 0.16;
const ACCENT: [u8; 4] = [255, 90, 140, 255];

/// High-energy scale-pop transitions with a particle field on top.
pub struct Vibrante;

impl Template for Vibrante {
    fn id(&self) -> &'static str {
        "vibrante"
    }

    fn render(&self, surface: &mut Surface, fonts: &mut FontBank, t: f64, ctx: &TemplateCtx<'_>) {
        surface.clear([26, 8, 20, 255]);

        if let Some(slot) = slideshow_slot(t, ctx.images.len(), TRANSITION_WINDOW) {
            if slot.mix < 1.0 {
                surface.blit_cover(&ctx.images[slot.from], &CoverBlit::default());
                // Incoming image pops up through cover size with overshoot.
                let scale = 0.65 + 0.35 * ease_out_back(slot.mix);
                surface.blit_cover(
                    &ctx.images[slot.to],
                    &CoverBlit {
                        zoom: scale.max(0.05),
                        alpha: (slot.mix * 2.0).min(1.0) as f32,
                        ..CoverBlit::default()
                    },
                );
            } else {
                surface.blit_cover(&ctx.images[slot.to], &CoverBlit::default());
            }
        }

        effects::particle_field(
            surface,
            t,
            derive_seed(ctx.seed, "vibrante.particles", 0),
            48,
            [255, 220, 180, 255],
        );
        let layout = TextLayout {
            cta: TextWindow {
                start: 0.55,
                end: 0.98,
                fade: 0.04,
            },
            ..TextLayout::default()
        };
        draw_standard_text(surface, fonts, ctx, t, &layout, ACCENT);
    }
}
