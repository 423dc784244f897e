use image::RgbaImage;

/// Premultiplied RGBA8 raster target. One per session; cleared and redrawn
/// every frame.
#[derive(Clone, Debug)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

pub type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied RGBA8, with an extra opacity multiplier.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = mul_div255(u16::from(src[3]), op).saturating_add(mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Straight-alpha color premultiplied into compositing space.
pub fn premul(color: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(color[3]);
    [
        mul_div255(u16::from(color[0]), a),
        mul_div255(u16::from(color[1]), a),
        mul_div255(u16::from(color[2]), a),
        color[3],
    ]
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

/// Cover-fit image placement parameters.
#[derive(Clone, Copy, Debug)]
pub struct CoverBlit {
    /// 1.0 = exact cover fit; >1.0 zooms in.
    pub zoom: f64,
    /// Pan across the overflow, -1..1 on each axis.
    pub pan_x: f64,
    pub pan_y: f64,
    /// Horizontal shift of the whole placement in surface pixels.
    pub offset_x: f64,
    pub alpha: f32,
}

impl Default for CoverBlit {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            offset_x: 0.0,
            alpha: 1.0,
        }
    }
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    /// Fill every pixel with an opaque color (premultiplied trivially).
    pub fn clear(&mut self, color: [u8; 4]) {
        let px = premul(color);
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    #[inline]
    fn blend_px(&mut self, x: i64, y: i64, src: PremulRgba8, opacity: f32) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let dst = [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ];
        let out = over(dst, src, opacity);
        self.data[idx..idx + 4].copy_from_slice(&out);
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: [u8; 4], opacity: f32) {
        if opacity <= 0.0 || color[3] == 0 {
            return;
        }
        let src = premul(color);
        for yy in y..y + i64::from(h) {
            for xx in x..x + i64::from(w) {
                self.blend_px(xx, yy, src, opacity);
            }
        }
    }

    pub fn fill_rounded_rect(
        &mut self,
        x: i64,
        y: i64,
        w: u32,
        h: u32,
        radius: u32,
        color: [u8; 4],
        opacity: f32,
    ) {
        if opacity <= 0.0 || color[3] == 0 || w == 0 || h == 0 {
            return;
        }
        let src = premul(color);
        let r = f64::from(radius.min(w / 2).min(h / 2));
        let (wf, hf) = (f64::from(w), f64::from(h));
        for yy in 0..i64::from(h) {
            for xx in 0..i64::from(w) {
                let px = xx as f64 + 0.5;
                let py = yy as f64 + 0.5;
                // Distance outside the rounded corner circle, 0 inside.
                let cx = px.clamp(r, wf - r);
                let cy = py.clamp(r, hf - r);
                let d = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
                let coverage = (r - d + 1.0).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                self.blend_px(x + xx, y + yy, src, opacity * coverage as f32);
            }
        }
    }

    pub fn fill_ellipse(
        &mut self,
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        color: [u8; 4],
        opacity: f32,
    ) {
        if opacity <= 0.0 || color[3] == 0 || rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let src = premul(color);
        let x0 = (cx - rx).floor() as i64;
        let x1 = (cx + rx).ceil() as i64;
        let y0 = (cy - ry).floor() as i64;
        let y1 = (cy + ry).ceil() as i64;
        for yy in y0..=y1 {
            for xx in x0..=x1 {
                let nx = (xx as f64 + 0.5 - cx) / rx;
                let ny = (yy as f64 + 0.5 - cy) / ry;
                let d = (nx * nx + ny * ny).sqrt();
                // ~1px antialiased rim.
                let edge = 1.0 / rx.min(ry);
                let coverage = ((1.0 - d) / edge + 0.5).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                self.blend_px(xx, yy, src, opacity * coverage as f32);
            }
        }
    }

    pub fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: [u8; 4], opacity: f32) {
        self.fill_ellipse(cx, cy, r, r, color, opacity);
    }

    /// Vertical top-to-bottom gradient between two opaque colors.
    pub fn fill_gradient_v(&mut self, top: [u8; 4], bottom: [u8; 4]) {
        let h = self.height.max(1);
        for y in 0..self.height {
            let t = f64::from(y) / f64::from(h - 1).max(1.0);
            let mut color = [0u8; 4];
            for i in 0..4 {
                color[i] =
                    (f64::from(top[i]) + (f64::from(bottom[i]) - f64::from(top[i])) * t) as u8;
            }
            let px = premul(color);
            let row = (y as usize) * (self.width as usize) * 4;
            for chunk in self.data[row..row + (self.width as usize) * 4].chunks_exact_mut(4) {
                chunk.copy_from_slice(&px);
            }
        }
    }

    /// Radial darkening toward the corners. `strength` 0..1.
    pub fn vignette(&mut self, strength: f32) {
        if strength <= 0.0 {
            return;
        }
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let max_d = ((w / 2.0).powi(2) + (h / 2.0).powi(2)).sqrt();
        for y in 0..self.height {
            for x in 0..self.width {
                let dx = f64::from(x) + 0.5 - w / 2.0;
                let dy = f64::from(y) + 0.5 - h / 2.0;
                let d = (dx * dx + dy * dy).sqrt() / max_d;
                let dim = 1.0 - (d.powi(2) * f64::from(strength)).min(1.0);
                let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
                for i in 0..3 {
                    self.data[idx + i] = (f64::from(self.data[idx + i]) * dim) as u8;
                }
            }
        }
    }

    /// Opaque horizontal bars at the top and bottom edges.
    pub fn letterbox(&mut self, bar_height: u32, color: [u8; 4]) {
        let bar = bar_height.min(self.height / 2);
        self.fill_rect(0, 0, self.width, bar, color, 1.0);
        self.fill_rect(
            0,
            i64::from(self.height - bar),
            self.width,
            bar,
            color,
            1.0,
        );
    }

    /// Composites another surface (already premultiplied) at a pixel offset.
    pub fn blit(&mut self, src: &Surface, x: i64, y: i64) {
        for sy in 0..src.height {
            for sx in 0..src.width {
                let idx = ((sy as usize) * (src.width as usize) + (sx as usize)) * 4;
                let px = [
                    src.data[idx],
                    src.data[idx + 1],
                    src.data[idx + 2],
                    src.data[idx + 3],
                ];
                if px[3] == 0 {
                    continue;
                }
                self.blend_px(x + i64::from(sx), y + i64::from(sy), px, 1.0);
            }
        }
    }

    /// Cover-fit blit of a straight-alpha image with zoom/pan/slide, bilinear
    /// sampled. Pixels that map outside the source are left untouched.
    pub fn blit_cover(&mut self, img: &RgbaImage, blit: &CoverBlit) {
        if blit.alpha <= 0.0 {
            return;
        }
        let (iw, ih) = (f64::from(img.width()), f64::from(img.height()));
        if iw < 1.0 || ih < 1.0 {
            return;
        }
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let scale = (w / iw).max(h / ih) * blit.zoom.max(0.01);

        // Image-space center, panned across the overflow.
        let overflow_x = (iw - w / scale).max(0.0);
        let overflow_y = (ih - h / scale).max(0.0);
        let cx = iw / 2.0 + blit.pan_x.clamp(-1.0, 1.0) * overflow_x / 2.0;
        let cy = ih / 2.0 + blit.pan_y.clamp(-1.0, 1.0) * overflow_y / 2.0;

        for y in 0..self.height {
            for x in 0..self.width {
                let dx = f64::from(x) + 0.5 - blit.offset_x;
                let sx = cx + (dx - w / 2.0) / scale;
                let sy = cy + (f64::from(y) + 0.5 - h / 2.0) / scale;
                if sx < 0.0 || sy < 0.0 || sx > iw - 1.0 || sy > ih - 1.0 {
                    continue;
                }
                let src = sample_bilinear(img, sx, sy);
                self.blend_px(i64::from(x), i64::from(y), premul(src), blit.alpha);
            }
        }
    }
}

fn sample_bilinear(img: &RgbaImage, x: f64, y: f64) -> [u8; 4] {
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(img.width() - 1);
    let y1 = (y0 + 1).min(img.height() - 1);
    let fx = (x - f64::from(x0)) as f32;
    let fy = (y - f64::from(y0)) as f32;

    let p00 = img.get_pixel(x0, y0).0;
    let p10 = img.get_pixel(x1, y0).0;
    let p01 = img.get_pixel(x0, y1).0;
    let p11 = img.get_pixel(x1, y1).0;

    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = f32::from(p00[i]) + (f32::from(p10[i]) - f32::from(p00[i])) * fx;
        let bot = f32::from(p01[i]) + (f32::from(p11[i]) - f32::from(p01[i])) * fx;
        out[i] = (top + (bot - top) * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_opacity_0_is_noop() {
        let dst = [1, 2, 3, 4];
        let src = [200, 200, 200, 200];
        assert_eq!(over(dst, src, 0.0), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn clear_sets_every_pixel() {
        let mut s = Surface::new(4, 4);
        s.clear([10, 20, 30, 255]);
        assert!(
            s.data
                .chunks_exact(4)
                .all(|c| c == [10, 20, 30, 255])
        );
    }

    #[test]
    fn fill_rect_clips_out_of_bounds() {
        let mut s = Surface::new(4, 4);
        s.clear([0, 0, 0, 255]);
        s.fill_rect(-2, -2, 10, 10, [255, 255, 255, 255], 1.0);
        assert!(s.data.chunks_exact(4).all(|c| c == [255, 255, 255, 255]));
    }

    #[test]
    fn blit_cover_zero_alpha_is_noop() {
        let mut s = Surface::new(4, 4);
        s.clear([1, 2, 3, 255]);
        let before = s.data.clone();
        let img = RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255]));
        s.blit_cover(
            &img,
            &CoverBlit {
                alpha: 0.0,
                ..CoverBlit::default()
            },
        );
        assert_eq!(before, s.data);
    }

    #[test]
    fn blit_cover_fills_surface_with_opaque_source() {
        let mut s = Surface::new(6, 6);
        s.clear([0, 0, 0, 255]);
        let img = RgbaImage::from_pixel(12, 12, image::Rgba([0, 255, 0, 255]));
        s.blit_cover(&img, &CoverBlit::default());
        assert!(s.data.chunks_exact(4).all(|c| c == [0, 255, 0, 255]));
    }
}
