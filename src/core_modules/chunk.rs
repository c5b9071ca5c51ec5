// THEORY:
// A `Chunk` is a rectangular block of pixels cut out of a raster, the unit of regional
// analysis for the activity grid. It is a "dumb" data container: it knows how to
// summarize its own pixels (mean color, mean absolute deviation from that mean) but
// nothing about its neighbors or where it sits in the grid.
//
// The mean absolute deviation is the activity measure. A flat fill has a deviation of
// zero; texture, photographic detail or glyph strokes raise it.

use crate::core_modules::pixel::Pixel;

pub type ChannelSum = u64;
/// Mean absolute deviation on the 0..255 channel scale.
pub type Deviation = f64;

/// A rectangular block of pixels.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// The width of the chunk in pixels.
    pub width: u32,
    /// The height of the chunk in pixels.
    pub height: u32,
    /// Row-major pixels within this chunk.
    pub pixels: Vec<Pixel>,
}

impl Chunk {
    pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Mean color of the chunk, rounded to the nearest channel value.
    pub fn average_pixel(&self) -> Pixel {
        let num_pixels = self.pixels.len() as ChannelSum;
        if num_pixels == 0 {
            return Pixel::default();
        }

        const CHUNK_SIZE: usize = 64;
        let mut sum_r: ChannelSum = 0;
        let mut sum_g: ChannelSum = 0;
        let mut sum_b: ChannelSum = 0;
        let mut sum_a: ChannelSum = 0;

        for block in self.pixels.chunks(CHUNK_SIZE) {
            for pixel in block {
                sum_r += pixel.red as ChannelSum;
                sum_g += pixel.green as ChannelSum;
                sum_b += pixel.blue as ChannelSum;
                sum_a += pixel.alpha as ChannelSum;
            }
        }

        let half = num_pixels / 2;
        Pixel {
            red: ((sum_r + half) / num_pixels) as u8,
            green: ((sum_g + half) / num_pixels) as u8,
            blue: ((sum_b + half) / num_pixels) as u8,
            alpha: ((sum_a + half) / num_pixels) as u8,
        }
    }

    /// Mean over pixels of the per-channel absolute deviation from the mean color,
    /// averaged across R, G and B (0..255 scale).
    pub fn mean_absolute_deviation(&self) -> Deviation {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let (mr, mg, mb) = self.mean_channels();
        let total: Deviation = self
            .pixels
            .iter()
            .map(|p| {
                ((p.red as f64 - mr).abs() + (p.green as f64 - mg).abs() + (p.blue as f64 - mb).abs())
                    / 3.0
            })
            .sum();
        total / self.pixels.len() as f64
    }

    fn mean_channels(&self) -> (f64, f64, f64) {
        let count = self.pixels.len() as f64;
        let (r, g, b) = self.pixels.iter().fold((0, 0, 0), |acc: (ChannelSum, ChannelSum, ChannelSum), p| {
            (
                acc.0 + p.red as ChannelSum,
                acc.1 + p.green as ChannelSum,
                acc.2 + p.blue as ChannelSum,
            )
        });
        (r as f64 / count, g as f64 / count, b as f64 / count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_chunk_has_no_deviation() {
        let chunk = Chunk::new(4, 4, vec![Pixel::opaque(40, 80, 120); 16]);
        assert_eq!(chunk.average_pixel(), Pixel::opaque(40, 80, 120));
        assert_eq!(chunk.mean_absolute_deviation(), 0.0);
    }

    #[test]
    fn checkerboard_deviation_is_half_the_swing() {
        let pixels = (0..16)
            .map(|i| if i % 2 == 0 { Pixel::opaque(0, 0, 0) } else { Pixel::WHITE })
            .collect();
        let chunk = Chunk::new(4, 4, pixels);
        assert!((chunk.mean_absolute_deviation() - 127.5).abs() < 1e-9);
    }

    #[test]
    fn empty_chunk_is_neutral() {
        let chunk = Chunk::new(0, 0, Vec::new());
        assert!(chunk.is_empty());
        assert_eq!(chunk.average_pixel(), Pixel::default());
        assert_eq!(chunk.mean_absolute_deviation(), 0.0);
    }
}
