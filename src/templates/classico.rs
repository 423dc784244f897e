use crate::{
    effects,
    rng::{derive_seed, unit_hash},
    surface::{CoverBlit, Surface},
    text::FontBank,
};

use super::{Template, TemplateCtx, TextLayout, draw_standard_text, slideshow_slot};

const TRANSITION_WINDOW: f64 = 0.15;
const ACCENT: [u8; 4] = [236, 178, 92, 255];

/// Warm crossfade slideshow with a slow Ken Burns pan/zoom on every slot.
pub struct Classico;

impl Template for Classico {
    fn id(&self) -> &'static str {
        "classico"
    }

    fn render(&self, surface: &mut Surface, fonts: &mut FontBank, t: f64, ctx: &TemplateCtx<'_>) {
        surface.clear([24, 16, 10, 255]);

        if let Some(slot) = slideshow_slot(t, ctx.images.len(), TRANSITION_WINDOW) {
            let count = ctx.images.len();
            let local = (t * count as f64).fract();
            let pan_seed = derive_seed(ctx.seed, "classico.pan", slot.to as u64);

            if slot.mix < 1.0 {
                // Outgoing image keeps drifting underneath the crossfade.
                surface.blit_cover(&ctx.images[slot.from], &kenburns_at(pan_seed ^ 1, 1.0));
            }
            surface.blit_cover(
                &ctx.images[slot.to],
                &CoverBlit {
                    alpha: slot.mix as f32,
                    ..kenburns_at(pan_seed, local)
                },
            );
        }

        effects::light_leak(
            surface,
            t,
            derive_seed(ctx.seed, "classico.leak", 0),
            [255, 170, 90, 255],
        );
        surface.vignette(0.35);
        draw_standard_text(surface, fonts, ctx, t, &TextLayout::default(), ACCENT);
    }
}

fn kenburns_at(seed: u64, local: f64) -> CoverBlit {
    // Direction fixed per slot; zoom eases across the slot.
    let dir_x = if unit_hash(seed, 0) < 0.5 { -1.0 } else { 1.0 };
    let dir_y = if unit_hash(seed, 1) < 0.5 { -1.0 } else { 1.0 };
    let local = local.clamp(0.0, 1.0);
    CoverBlit {
        zoom: 1.03 + 0.07 * local,
        pan_x: dir_x * (local - 0.5) * 0.8,
        pan_y: dir_y * (local - 0.5) * 0.4,
        offset_x: 0.0,
        alpha: 1.0,
    }
}
