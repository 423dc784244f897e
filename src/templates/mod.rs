mod apresentador;
mod avatar;
mod classico;
mod elegante;
mod minimalista;
mod moderno;
mod vibrante;

pub use apresentador::Apresentador;
pub use avatar::{AvatarPose, draw_avatar};
pub use classico::Classico;
pub use elegante::Elegante;
pub use minimalista::Minimalista;
pub use moderno::Moderno;
pub use vibrante::Vibrante;

use image::RgbaImage;
use tracing::warn;

use crate::{request::TextContent, surface::Surface, text::FontBank};

pub const DEFAULT_TEMPLATE_ID: &str = "elegante";
pub const PRESENTER_TEMPLATE_ID: &str = "apresentador";

/// Inputs shared by every template, fixed for the whole session.
pub struct TemplateCtx<'a> {
    pub images: &'a [RgbaImage],
    pub text: &'a TextContent,
    pub seed: u64,
    pub duration_secs: f64,
    /// True while narration is audibly speaking (presenter avatar mouth).
    pub speaking: bool,
}

/// A visual composition strategy: a deterministic mapping from normalized
/// time to one composited frame. Implementations must be pure in
/// `(t, images, text, seed)`.
pub trait Template: Send + Sync {
    fn id(&self) -> &'static str;
    fn render(&self, surface: &mut Surface, fonts: &mut FontBank, t: f64, ctx: &TemplateCtx<'_>);
}

pub struct TemplateRegistry {
    templates: Vec<Box<dyn Template>>,
}

impl TemplateRegistry {
    pub fn builtin() -> Self {
        Self {
            templates: vec![
                Box::new(Elegante),
                Box::new(Classico),
                Box::new(Moderno),
                Box::new(Vibrante),
                Box::new(Minimalista),
                Box::new(Apresentador),
            ],
        }
    }

    /// Lookup by id; unknown ids fall back to the default without error.
    pub fn resolve(&self, id: &str) -> &dyn Template {
        let wanted = id.trim().to_ascii_lowercase();
        if let Some(t) = self.templates.iter().find(|t| t.id() == wanted) {
            return t.as_ref();
        }
        warn!(template = %id, fallback = DEFAULT_TEMPLATE_ID, "unknown template id");
        self.templates
            .iter()
            .find(|t| t.id() == DEFAULT_TEMPLATE_ID)
            .map(|t| t.as_ref())
            .unwrap_or_else(|| self.templates[0].as_ref())
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.templates.iter().map(|t| t.id()).collect()
    }
}

/// Where the slideshow sits at `t`: blending from `from` into `to` while
/// `mix < 1`, settled on `to` afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotState {
    pub from: usize,
    pub to: usize,
    pub mix: f64,
}

/// Divide `[0,1]` into one slot per image, with a transition window spanning
/// the first `window` fraction of each slot. Returns `None` for zero images;
/// a single image disables transitions entirely.
pub fn slideshow_slot(t: f64, count: usize, window: f64) -> Option<SlotState> {
    if count == 0 {
        return None;
    }
    let t = t.clamp(0.0, 1.0);
    let idx = ((t * count as f64).floor() as usize).min(count - 1);
    if count == 1 || idx == 0 {
        return Some(SlotState {
            from: idx,
            to: idx,
            mix: 1.0,
        });
    }
    let local = t * count as f64 - idx as f64;
    let mix = if window > 0.0 && local < window {
        local / window
    } else {
        1.0
    };
    Some(SlotState {
        from: idx - 1,
        to: idx,
        mix,
    })
}

/// Entrance/exit alpha window for a text layer, as fractions of `t`.
#[derive(Clone, Copy, Debug)]
pub struct TextWindow {
    pub start: f64,
    pub end: f64,
    /// Ramp length at each edge, as a fraction of `t`.
    pub fade: f64,
}

impl TextWindow {
    pub fn alpha(&self, t: f64) -> f32 {
        if t < self.start || t > self.end || self.fade <= 0.0 {
            if t >= self.start && t <= self.end {
                return 1.0;
            }
            return 0.0;
        }
        let fade_in = ((t - self.start) / self.fade).clamp(0.0, 1.0);
        let fade_out = ((self.end - t) / self.fade).clamp(0.0, 1.0);
        fade_in.min(fade_out) as f32
    }
}

/// Centered, wrapped text layer at a vertical position fraction.
#[allow(clippy::too_many_arguments)]
pub fn draw_text_layer(
    surface: &mut Surface,
    fonts: &mut FontBank,
    text: &str,
    px: f32,
    color: [u8; 4],
    y_frac: f64,
    t: f64,
    window: TextWindow,
) {
    let alpha = window.alpha(t);
    if alpha <= 0.0 || text.trim().is_empty() {
        return;
    }
    let Some(painter) = fonts.painter_mut() else {
        return;
    };
    let max_width = surface.width as f32 * 0.85;
    let lines = crate::text::wrap_text(text, max_width, |s| painter.measure(s, px));
    let line_h = painter.line_height(px);
    let block_h = line_h * lines.len() as f32;
    let top = surface.height as f32 * y_frac as f32 - block_h / 2.0;
    for (i, line) in lines.iter().enumerate() {
        let line_w = painter.measure(line, px);
        let x = (surface.width as f32 - line_w) / 2.0;
        painter.draw(surface, x, top + i as f32 * line_h, line, px, color, alpha);
    }
}

/// Standard four text layers with per-template timing baked by the caller.
pub struct TextLayout {
    pub headline: TextWindow,
    pub subtext: TextWindow,
    pub cta: TextWindow,
    pub name: TextWindow,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            headline: TextWindow {
                start: 0.04,
                end: 0.55,
                fade: 0.05,
            },
            subtext: TextWindow {
                start: 0.12,
                end: 0.60,
                fade: 0.05,
            },
            cta: TextWindow {
                start: 0.62,
                end: 0.97,
                fade: 0.05,
            },
            name: TextWindow {
                start: 0.02,
                end: 0.98,
                fade: 0.04,
            },
        }
    }
}

pub fn draw_standard_text(
    surface: &mut Surface,
    fonts: &mut FontBank,
    ctx: &TemplateCtx<'_>,
    t: f64,
    layout: &TextLayout,
    accent: [u8; 4],
) {
    let w = surface.width as f32;
    draw_text_layer(
        surface,
        fonts,
        &ctx.text.headline,
        (w * 0.085).clamp(36.0, 110.0),
        [255, 255, 255, 255],
        0.22,
        t,
        layout.headline,
    );
    draw_text_layer(
        surface,
        fonts,
        &ctx.text.subtext,
        (w * 0.045).clamp(24.0, 60.0),
        [235, 235, 235, 230],
        0.32,
        t,
        layout.subtext,
    );
    draw_text_layer(
        surface,
        fonts,
        &ctx.text.cta,
        (w * 0.06).clamp(30.0, 80.0),
        accent,
        0.5,
        t,
        layout.cta,
    );
    draw_text_layer(
        surface,
        fonts,
        &ctx.text.restaurant_name,
        (w * 0.035).clamp(20.0, 46.0),
        [255, 255, 255, 210],
        0.93,
        t,
        layout.name,
    );
}

pub(crate) fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(3)
}

/// Ease-out with a small overshoot past 1.0.
pub(crate) fn ease_out_back(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let c1 = 1.70158;
    let c3 = c1 + 1.0;
    1.0 + c3 * (t - 1.0).powi(3) + c1 * (t - 1.0).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easings_hit_endpoints() {
        assert!((ease_out_cubic(0.0)).abs() < 1e-9);
        assert!((ease_out_cubic(1.0) - 1.0).abs() < 1e-9);
        assert!((ease_out_back(0.0)).abs() < 1e-9);
        assert!((ease_out_back(1.0) - 1.0).abs() < 1e-9);
        assert!(ease_out_back(0.7) > 1.0);
    }

    #[test]
    fn zero_images_yields_none() {
        assert!(slideshow_slot(0.5, 0, 0.15).is_none());
    }

    #[test]
    fn single_image_never_transitions() {
        for t in [0.0, 0.05, 0.5, 0.99] {
            let slot = slideshow_slot(t, 1, 0.15).unwrap();
            assert_eq!(slot.from, slot.to);
            assert_eq!(slot.mix, 1.0);
        }
    }

    #[test]
    fn slots_cover_all_images_in_order() {
        let count = 4;
        let mut seen = Vec::new();
        for i in 0..100 {
            let t = i as f64 / 100.0;
            let slot = slideshow_slot(t, count, 0.15).unwrap();
            if seen.last() != Some(&slot.to) {
                seen.push(slot.to);
            }
        }
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn transition_window_blends_from_previous_image() {
        // Just inside slot 1's window.
        let slot = slideshow_slot(0.26, 4, 0.15).unwrap();
        assert_eq!(slot.from, 0);
        assert_eq!(slot.to, 1);
        assert!(slot.mix < 1.0 && slot.mix > 0.0);
        // Past the window the slot is settled.
        let slot = slideshow_slot(0.35, 4, 0.15).unwrap();
        assert_eq!(slot.mix, 1.0);
    }

    #[test]
    fn unknown_template_resolves_to_default() {
        let registry = TemplateRegistry::builtin();
        let t = registry.resolve("doesnotexist");
        assert_eq!(t.id(), DEFAULT_TEMPLATE_ID);
    }

    #[test]
    fn registry_contains_five_templates_plus_presenter() {
        let registry = TemplateRegistry::builtin();
        let ids = registry.ids();
        assert_eq!(ids.len(), 6);
        assert!(ids.contains(&PRESENTER_TEMPLATE_ID));
        assert!(ids.contains(&DEFAULT_TEMPLATE_ID));
    }

    #[test]
    fn text_window_alpha_ramps() {
        let w = TextWindow {
            start: 0.2,
            end: 0.8,
            fade: 0.1,
        };
        assert_eq!(w.alpha(0.1), 0.0);
        assert_eq!(w.alpha(0.9), 0.0);
        assert!((w.alpha(0.5) - 1.0).abs() < 1e-6);
        assert!(w.alpha(0.25) > 0.0 && w.alpha(0.25) < 1.0);
    }
}
