use crate::{
    effects,
    rng::derive_seed,
    surface::{CoverBlit, Surface},
    text::FontBank,
};

use super::{
    Template, TemplateCtx, TextWindow, avatar::draw_avatar, draw_text_layer, slideshow_slot,
};

const ACCENT: [u8; 4] = [255, 196, 110, 255];

/// Presenter mode: a procedural talking host over a gradient backdrop, with
/// dish images shown as an inset card above the avatar.
pub struct Apresentador;

impl Template for Apresentador {
    fn id(&self) -> &'static str {
        "apresentador"
    }

    fn render(&self, surface: &mut Surface, fonts: &mut FontBank, t: f64, ctx: &TemplateCtx<'_>) {
        surface.fill_gradient_v([34, 24, 48, 255], [12, 10, 22, 255]);
        effects::particle_field(
            surface,
            t,
            derive_seed(ctx.seed, "apresentador.dust", 0),
            24,
            [255, 230, 200, 140],
        );

        // Inset dish card in the upper third; images are optional here.
        if let Some(slot) = slideshow_slot(t, ctx.images.len(), 0.15) {
            let w = f64::from(surface.width);
            let h = f64::from(surface.height);
            let card_w = w * 0.62;
            let card_h = h * 0.26;
            let card_x = (w - card_w) / 2.0;
            let card_y = h * 0.08;
            surface.fill_rounded_rect(
                (card_x - 6.0) as i64,
                (card_y - 6.0) as i64,
                (card_w + 12.0) as u32,
                (card_h + 12.0) as u32,
                18,
                [255, 255, 255, 255],
                0.16,
            );
            let mut card = Surface::new(card_w as u32, card_h as u32);
            card.blit_cover(&ctx.images[slot.from], &CoverBlit::default());
            if slot.mix < 1.0 || slot.from != slot.to {
                card.blit_cover(
                    &ctx.images[slot.to],
                    &CoverBlit {
                        alpha: slot.mix as f32,
                        ..CoverBlit::default()
                    },
                );
            }
            surface.blit(&card, card_x as i64, card_y as i64);
        }

        draw_avatar(
            surface,
            t,
            ctx.duration_secs,
            derive_seed(ctx.seed, "apresentador.avatar", 0),
            ctx.speaking,
        );

        let w = surface.width as f32;
        draw_text_layer(
            surface,
            fonts,
            &ctx.text.headline,
            (w * 0.065).clamp(30.0, 84.0),
            [255, 255, 255, 255],
            0.42,
            t,
            TextWindow {
                start: 0.02,
                end: 0.45,
                fade: 0.05,
            },
        );
        draw_text_layer(
            surface,
            fonts,
            &ctx.text.cta,
            (w * 0.05).clamp(26.0, 64.0),
            ACCENT,
            0.42,
            t,
            TextWindow {
                start: 0.70,
                end: 0.97,
                fade: 0.05,
            },
        );
        draw_text_layer(
            surface,
            fonts,
            &ctx.text.restaurant_name,
            (w * 0.035).clamp(20.0, 46.0),
            [255, 255, 255, 210],
            0.95,
            t,
            TextWindow {
                start: 0.02,
                end: 0.98,
                fade: 0.04,
            },
        );
    }
}
