use crate::{
    effects,
    rng::derive_seed,
    surface::{CoverBlit, Surface},
    text::FontBank,
};

use super::{
    Template, TemplateCtx, TextLayout, TextWindow, draw_standard_text, ease_out_cubic,
    slideshow_slot,
};

const TRANSITION_WINDOW: f64 = 0.18;
const ACCENT: [u8; 4] = [80, 200, 255, 255];

/// Flat-color frame with hard horizontal slide transitions.
pub struct Moderno;

impl Template for Moderno {
    fn id(&self) -> &'static str {
        "moderno"
    }

    fn render(&self, surface: &mut Surface, fonts: &mut FontBank, t: f64, ctx: &TemplateCtx<'_>) {
        surface.clear([14, 17, 22, 255]);

        if let Some(slot) = slideshow_slot(t, ctx.images.len(), TRANSITION_WINDOW) {
            let w = f64::from(surface.width);
            if slot.mix < 1.0 {
                let shift = ease_out_cubic(slot.mix) * w;
                // Outgoing image exits left while the next one pushes in.
                surface.blit_cover(
                    &ctx.images[slot.from],
                    &CoverBlit {
                        offset_x: -shift,
                        ..CoverBlit::default()
                    },
                );
                surface.blit_cover(
                    &ctx.images[slot.to],
                    &CoverBlit {
                        offset_x: w - shift,
                        ..CoverBlit::default()
                    },
                );
            } else {
                surface.blit_cover(&ctx.images[slot.to], &CoverBlit::default());
            }
        }

        effects::accent_sweep(
            surface,
            t,
            derive_seed(ctx.seed, "moderno.sweep", 0),
            ACCENT,
        );
        let layout = TextLayout {
            headline: TextWindow {
                start: 0.03,
                end: 0.50,
                fade: 0.04,
            },
            ..TextLayout::default()
        };
        draw_standard_text(surface, fonts, ctx, t, &layout, ACCENT);
    }
}
