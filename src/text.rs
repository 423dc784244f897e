use std::{collections::HashMap, path::Path, path::PathBuf};

use anyhow::{Context as _, anyhow};
use fontdue::{
    Font, FontSettings,
    layout::{CoordinateSystem, GlyphRasterConfig, Layout, LayoutSettings, TextStyle},
};
use tracing::warn;

use crate::surface::{Surface, premul};

#[derive(Clone, Debug)]
struct GlyphBitmap {
    width: usize,
    height: usize,
    bitmap: Vec<u8>,
}

/// Rasterizes text into a [`Surface`] with a per-font glyph cache.
pub struct TextPainter {
    font: Font,
    glyph_cache: HashMap<GlyphRasterConfig, GlyphBitmap>,
}

impl TextPainter {
    pub fn from_bytes(bytes: Vec<u8>) -> anyhow::Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| anyhow!("failed to parse font: {e}"))?;
        Ok(Self {
            font,
            glyph_cache: HashMap::new(),
        })
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        Self::from_bytes(bytes)
    }

    /// Advance width of `text` at `px`, without rasterizing.
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        text.chars()
            .map(|c| self.font.metrics(c, px).advance_width)
            .sum()
    }

    pub fn line_height(&self, px: f32) -> f32 {
        px * 1.3
    }

    /// Draw a single line with its top-left corner at (x, y).
    pub fn draw(
        &mut self,
        surface: &mut Surface,
        x: f32,
        y: f32,
        text: &str,
        px: f32,
        color: [u8; 4],
        opacity: f32,
    ) {
        if opacity <= 0.0 || text.is_empty() {
            return;
        }
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x,
            y,
            ..LayoutSettings::default()
        });
        layout.append(&[&self.font], &TextStyle::new(text, px, 0));

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let bitmap = self.glyph_cache.entry(glyph.key).or_insert_with(|| {
                let (_, bitmap) = self.font.rasterize_config(glyph.key);
                GlyphBitmap {
                    width: glyph.width,
                    height: glyph.height,
                    bitmap,
                }
            });
            blend_glyph(
                surface,
                glyph.x.round() as i64,
                glyph.y.round() as i64,
                bitmap,
                color,
                opacity,
            );
        }
    }
}

fn blend_glyph(
    surface: &mut Surface,
    gx: i64,
    gy: i64,
    glyph: &GlyphBitmap,
    color: [u8; 4],
    opacity: f32,
) {
    for row in 0..glyph.height {
        for col in 0..glyph.width {
            let coverage = glyph.bitmap[row * glyph.width + col];
            if coverage == 0 {
                continue;
            }
            let a = (u16::from(color[3]) * u16::from(coverage) / 255) as u8;
            let src = premul([color[0], color[1], color[2], a]);
            let x = gx + col as i64;
            let y = gy + row as i64;
            if x < 0 || y < 0 || x >= i64::from(surface.width) || y >= i64::from(surface.height) {
                continue;
            }
            let idx = ((y as usize) * (surface.width as usize) + (x as usize)) * 4;
            let dst = [
                surface.data[idx],
                surface.data[idx + 1],
                surface.data[idx + 2],
                surface.data[idx + 3],
            ];
            let out = crate::surface::over(dst, src, opacity);
            surface.data[idx..idx + 4].copy_from_slice(&out);
        }
    }
}

/// Holds the session's fonts. Text is best-effort: when no usable font is
/// found the bank is empty and text layers are skipped (reported as a
/// degradation, never an error).
pub struct FontBank {
    painter: Option<TextPainter>,
}

impl FontBank {
    pub fn empty() -> Self {
        Self { painter: None }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            painter: Some(TextPainter::from_file(path)?),
        })
    }

    /// Probe `PROMOREEL_FONT`, then well-known system font locations.
    pub fn discover() -> Self {
        for candidate in candidate_fonts() {
            if candidate.is_file() {
                match TextPainter::from_file(&candidate) {
                    Ok(painter) => {
                        return Self {
                            painter: Some(painter),
                        };
                    }
                    Err(e) => warn!(font = %candidate.display(), error = %e, "skipping font"),
                }
            }
        }
        warn!("no usable font found; text layers will be skipped");
        Self::empty()
    }

    pub fn available(&self) -> bool {
        self.painter.is_some()
    }

    pub fn painter_mut(&mut self) -> Option<&mut TextPainter> {
        self.painter.as_mut()
    }

    pub fn painter(&self) -> Option<&TextPainter> {
        self.painter.as_ref()
    }
}

fn candidate_fonts() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(p) = std::env::var("PROMOREEL_FONT") {
        out.push(PathBuf::from(p));
    }
    for p in [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ] {
        out.push(PathBuf::from(p));
    }
    // Shallow scan as a last resort.
    for root in ["/usr/share/fonts", "/usr/local/share/fonts"] {
        scan_for_fonts(Path::new(root), 3, &mut out);
    }
    out
}

fn scan_for_fonts(dir: &Path, depth: u8, out: &mut Vec<PathBuf>) {
    if depth == 0 {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan_for_fonts(&path, depth - 1, out);
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("ttf") | Some("otf")
        ) {
            out.push(path);
        }
    }
}

/// Greedy word wrap against a pixel-width measurer. Pure; the measurer is a
/// closure so layout logic is testable without a rasterizer.
pub fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if current.is_empty() || measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
