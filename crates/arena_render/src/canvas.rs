//! A minimal RGBA drawing surface on top of [`image::RgbaImage`].
//!
//! Only the primitives the arena needs: solid fills with alpha blending,
//! filled circles, and circle-clipped image blits. All coordinates are in
//! pixels; anything falling off the surface is silently clipped.

use image::{Rgba, RgbaImage};

/// Opaque RGB color.
pub type Rgb = [u8; 3];

/// Parse a `#RRGGBB` literal at compile time.
#[must_use]
pub const fn hex(value: u32) -> Rgb {
    [(value >> 16) as u8, (value >> 8) as u8, value as u8]
}

fn blend_channel(dst: u8, src: u8, alpha: f32) -> u8 {
    (f32::from(dst) * (1.0 - alpha) + f32::from(src) * alpha).round() as u8
}

/// Drawing surface. Owned by the renderer and overwritten every frame.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Create a black surface.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        }
    }

    /// Surface width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Surface height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Finished pixels.
    #[must_use]
    pub const fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Overwrite every pixel.
    pub fn fill(&mut self, color: Rgb) {
        let [r, g, b] = color;
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([r, g, b, 255]);
        }
    }

    fn blend_pixel(&mut self, x: u32, y: u32, color: Rgb, alpha: f32) {
        if alpha <= 0.0 {
            return;
        }
        let Some(pixel) = self.image.get_pixel_mut_checked(x, y) else {
            return;
        };
        let alpha = alpha.min(1.0);
        let [r, g, b] = color;
        let Rgba([dr, dg, db, _]) = *pixel;
        *pixel = Rgba([
            blend_channel(dr, r, alpha),
            blend_channel(dg, g, alpha),
            blend_channel(db, b, alpha),
            255,
        ]);
    }

    /// Pixel span `[start, end)` covered by `[min, min + len)`, clipped to `limit`.
    fn span(min: f32, len: f32, limit: u32) -> std::ops::Range<u32> {
        let start = min.floor().max(0.0);
        let end = (min + len).ceil().min(limit as f32);
        if !start.is_finite() || !end.is_finite() || end <= start {
            return 0..0;
        }
        start as u32..end as u32
    }

    /// Fill an axis-aligned rectangle.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb, alpha: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let xs = Self::span(x, width, self.width());
        let ys = Self::span(y, height, self.height());
        for py in ys {
            for px in xs.clone() {
                self.blend_pixel(px, py, color, alpha);
            }
        }
    }

    /// Visit every pixel whose centre lies inside the circle.
    fn for_circle(&self, cx: f32, cy: f32, radius: f32, mut visit: impl FnMut(u32, u32)) {
        if radius <= 0.0 {
            return;
        }
        let r2 = radius * radius;
        let xs = Self::span(cx - radius, radius * 2.0, self.width());
        let ys = Self::span(cy - radius, radius * 2.0, self.height());
        for py in ys {
            let dy = py as f32 + 0.5 - cy;
            for px in xs.clone() {
                let dx = px as f32 + 0.5 - cx;
                if dx * dx + dy * dy <= r2 {
                    visit(px, py);
                }
            }
        }
    }

    /// Fill a circle.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32) {
        let mut covered = Vec::new();
        self.for_circle(cx, cy, radius, |x, y| covered.push((x, y)));
        for (x, y) in covered {
            self.blend_pixel(x, y, color, alpha);
        }
    }

    /// Draw `source` scaled into the circle's bounding square, clipped to the circle.
    ///
    /// `source` should already be sized to the circle's diameter; other sizes
    /// are sampled nearest-neighbour.
    pub fn blit_circle(&mut self, source: &RgbaImage, cx: f32, cy: f32, radius: f32) {
        if source.width() == 0 || source.height() == 0 {
            return;
        }
        let left = cx - radius;
        let top = cy - radius;
        let diameter = radius * 2.0;
        let sx_scale = source.width() as f32 / diameter;
        let sy_scale = source.height() as f32 / diameter;

        let mut covered = Vec::new();
        self.for_circle(cx, cy, radius, |x, y| covered.push((x, y)));
        for (x, y) in covered {
            let sx = (((x as f32 + 0.5 - left) * sx_scale) as u32).min(source.width() - 1);
            let sy = (((y as f32 + 0.5 - top) * sy_scale) as u32).min(source.height() - 1);
            let Rgba([r, g, b, a]) = *source.get_pixel(sx, sy);
            self.blend_pixel(x, y, [r, g, b], f32::from(a) / 255.0);
        }
    }
}
