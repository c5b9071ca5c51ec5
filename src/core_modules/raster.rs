// THEORY:
// A `Raster` is the decoded, analysis-ready form of a candidate image: an opaque
// pixel grid with transparency composited onto white, so an icon on a transparent
// canvas reads as a mark on a flat background. Every primitive in `core_modules`
// works on a `Raster`; none of them touch encoded bytes or the `image` crate types.
//
// Analysis normally runs on a thumbnail: each axis is clamped to `THUMBNAIL_SIZE`
// independently, so a wide banner is squashed onto a fixed grid rather than shrunk with
// its aspect ratio. The pixel thresholds downstream are calibrated on that grid. The
// thumbnail is built with a fixed filter so the same bytes always yield the same pixels.

use crate::core_modules::pixel::Pixel;
use image::{DynamicImage, RgbaImage, imageops::FilterType};

/// Width or height in pixels.
pub type Dimension = u32;
pub type AspectRatio = f64;

/// Side length of the analysis thumbnail.
pub const THUMBNAIL_SIZE: Dimension = 50;

/// An opaque, row-major pixel grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: Dimension,
    pub height: Dimension,
    pixels: Vec<Pixel>,
}

impl Raster {
    /// Builds a raster from row-major pixels. Missing pixels are filled with white.
    pub fn new(width: Dimension, height: Dimension, mut pixels: Vec<Pixel>) -> Self {
        let expected = (width as usize) * (height as usize);
        pixels.resize(expected, Pixel::WHITE);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Flattens an RGBA image onto white at full resolution.
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let pixels = image
            .pixels()
            .map(|p| Pixel::from(*p).flatten_over(Pixel::WHITE))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Flattens onto white, then clamps each axis to `max_side` on its own (never enlarges).
    ///
    /// The aspect ratio is not preserved: a 400x120 image becomes 50x50 at the default size.
    pub fn thumbnail(image: &DynamicImage, max_side: Dimension) -> Self {
        let mut rgba = image.to_rgba8();
        for pixel in rgba.pixels_mut() {
            *pixel = Pixel::from(*pixel).flatten_over(Pixel::WHITE).into();
        }
        let (width, height) = rgba.dimensions();
        let target_w = width.min(max_side).max(1);
        let target_h = height.min(max_side).max(1);
        if target_w != width || target_h != height {
            rgba = image::imageops::resize(&rgba, target_w, target_h, FilterType::Triangle);
        }
        Self::from_rgba(&rgba)
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    #[inline]
    pub fn index(&self, x: Dimension, y: Dimension) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn get(&self, x: Dimension, y: Dimension) -> Pixel {
        self.pixels[self.index(x, y)]
    }

    /// Pixels of the axis-aligned region `[x0, x1) x [y0, y1)`, clamped to the raster.
    pub fn region(&self, x0: Dimension, y0: Dimension, x1: Dimension, y1: Dimension) -> Vec<Pixel> {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        let mut out = Vec::with_capacity((x1.saturating_sub(x0) * y1.saturating_sub(y0)) as usize);
        for y in y0..y1 {
            let row = self.index(0, y);
            out.extend_from_slice(&self.pixels[row + x0 as usize..row + x1 as usize]);
        }
        out
    }

    /// The four corner pixels, clockwise from top-left.
    pub fn corners(&self) -> [Pixel; 4] {
        let (w, h) = (self.width.saturating_sub(1), self.height.saturating_sub(1));
        [self.get(0, 0), self.get(w, 0), self.get(w, h), self.get(0, h)]
    }

    /// Width divided by height, or 1.0 for degenerate rasters.
    pub fn aspect_ratio(&self) -> AspectRatio {
        if self.height == 0 {
            return 1.0;
        }
        self.width as AspectRatio / self.height as AspectRatio
    }
}
