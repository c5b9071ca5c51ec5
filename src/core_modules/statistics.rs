// THEORY:
// Whole-raster statistics. Each function reduces a raster to one number (or one color)
// and is a pure function of the pixels. Together with the activity grid and region
// growing they form the complete set of numeric heuristics; the pipelines only combine
// these values against thresholds from the configuration.
//
// - Quantized color count: distinct color buckets. Flat art stays in single digits,
//   photographs reach dozens.
// - Edge density: mean neighbor-to-neighbor channel difference. Flat fills read < 10,
//   photographic texture > 25.
// - High-contrast edge ratio and axis-aligned edge bias: the sharp, horizontal and
//   vertical strokes of typography and UI chrome.
// - Saturation variance: photographs mix muted and vivid regions, slides rarely do.
// - Border strip color: the letterbox fill for contain-fit display.
// - Dominant color: the most prominent non-background color of a brand mark.

use crate::core_modules::pixel::Pixel;
use crate::core_modules::raster::Raster;
use crate::core_modules::region::corner_background;
use std::collections::HashSet;

/// Coarse bucket for color counting of brand marks.
pub const COARSE_BUCKET: u8 = 32;
/// Fine bucket for color counting of hero images.
pub const FINE_BUCKET: u8 = 16;
/// Luma step between neighbors that counts as a high-contrast edge.
pub const HIGH_CONTRAST_LUMA_STEP: f64 = 80.0;
/// Summed gradient magnitude above which a pixel is an edge for orientation analysis.
pub const STRONG_EDGE_GRADIENT: f64 = 40.0;
/// An edge is axis-aligned when one gradient dominates the other by this factor.
pub const AXIS_DOMINANCE: f64 = 3.0;
/// Pixels within this channel distance of the background are ignored for dominant color.
pub const BACKGROUND_TOLERANCE: u8 = 24;

/// Number of distinct colors after rounding each channel down to `bucket_size` steps.
pub fn quantized_color_count(raster: &Raster, bucket_size: u8) -> usize {
    raster
        .pixels()
        .iter()
        .map(|p| p.quantized(bucket_size))
        .collect::<HashSet<_>>()
        .len()
}

/// Mean over pixels of the summed channel difference to the right and bottom neighbors,
/// normalized by the number of neighbors compared (0..765 scale).
pub fn edge_density(raster: &Raster) -> f64 {
    let mut total = 0.0;
    let mut counted = 0usize;
    for y in 0..raster.height {
        for x in 0..raster.width {
            let here = raster.get(x, y);
            let mut sum = 0u32;
            let mut comparisons = 0u32;
            if x + 1 < raster.width {
                sum += here.channel_distance(&raster.get(x + 1, y));
                comparisons += 1;
            }
            if y + 1 < raster.height {
                sum += here.channel_distance(&raster.get(x, y + 1));
                comparisons += 1;
            }
            if comparisons > 0 {
                total += sum as f64 / comparisons as f64;
                counted += 1;
            }
        }
    }
    if counted == 0 {
        return 0.0;
    }
    total / counted as f64
}

/// Fraction of neighbor comparisons whose luma step exceeds `step`.
pub fn high_contrast_edge_ratio(raster: &Raster, step: f64) -> f64 {
    let mut sharp = 0usize;
    let mut comparisons = 0usize;
    for y in 0..raster.height {
        for x in 0..raster.width {
            let here = raster.get(x, y).luminance();
            if x + 1 < raster.width {
                comparisons += 1;
                if (raster.get(x + 1, y).luminance() - here).abs() > step {
                    sharp += 1;
                }
            }
            if y + 1 < raster.height {
                comparisons += 1;
                if (raster.get(x, y + 1).luminance() - here).abs() > step {
                    sharp += 1;
                }
            }
        }
    }
    if comparisons == 0 {
        return 0.0;
    }
    sharp as f64 / comparisons as f64
}

/// Share of strong edges that are purely horizontal or vertical (0..1).
pub fn axis_aligned_edge_bias(raster: &Raster) -> f64 {
    let mut strong = 0usize;
    let mut aligned = 0usize;
    for y in 0..raster.height.saturating_sub(1) {
        for x in 0..raster.width.saturating_sub(1) {
            let here = raster.get(x, y).luminance();
            let gx = (raster.get(x + 1, y).luminance() - here).abs();
            let gy = (raster.get(x, y + 1).luminance() - here).abs();
            if gx + gy <= STRONG_EDGE_GRADIENT {
                continue;
            }
            strong += 1;
            if gx.max(gy) >= AXIS_DOMINANCE * gx.min(gy) {
                aligned += 1;
            }
        }
    }
    if strong == 0 {
        return 0.0;
    }
    aligned as f64 / strong as f64
}

/// Variance of per-pixel chroma (normalized to 0..1), a stable saturation proxy.
pub fn saturation_variance(raster: &Raster) -> f64 {
    let count = raster.pixel_count();
    if count == 0 {
        return 0.0;
    }
    // Integer sums keep a flat fill at exactly zero.
    let (sum, sum_sq) = raster.pixels().iter().fold((0u64, 0u64), |(sum, sum_sq), p| {
        let chroma = p.chroma() as u64;
        (sum + chroma, sum_sq + chroma * chroma)
    });
    let n = count as u128;
    let (sum, sum_sq) = (sum as u128, sum_sq as u128);
    let spread = (n * sum_sq - sum * sum) as f64 / (n * n) as f64;
    spread / (255.0 * 255.0)
}

/// Average color of the strip of width `strip` along all four edges.
pub fn border_strip_color(raster: &Raster, strip: u32) -> Pixel {
    if raster.is_empty() {
        return Pixel::WHITE;
    }
    let strip = strip.max(1);
    let (mut r, mut g, mut b, mut n) = (0u64, 0u64, 0u64, 0u64);
    for y in 0..raster.height {
        for x in 0..raster.width {
            let on_edge = x < strip
                || y < strip
                || x + strip >= raster.width
                || y + strip >= raster.height;
            if on_edge {
                let p = raster.get(x, y);
                r += p.red as u64;
                g += p.green as u64;
                b += p.blue as u64;
                n += 1;
            }
        }
    }
    let half = n / 2;
    Pixel::opaque(
        ((r + half) / n) as u8,
        ((g + half) / n) as u8,
        ((b + half) / n) as u8,
    )
}

/// Most prominent non-background color, weighted toward saturated pixels.
///
/// Returns `None` when every pixel matches the background estimate.
pub fn dominant_color(raster: &Raster) -> Option<Pixel> {
    if raster.is_empty() {
        return None;
    }
    let background = corner_background(raster);

    // 5-bit buckets per channel: (weight, sum_r, sum_g, sum_b, count).
    let mut buckets = vec![(0u32, 0u64, 0u64, 0u64, 0u64); 32 * 32 * 32];
    for p in raster.pixels() {
        if p.max_channel_distance(&background) <= BACKGROUND_TOLERANCE {
            continue;
        }
        let weight = 1 + p.chroma() as u32 / 24;
        let index = ((p.red as usize >> 3) << 10) | ((p.green as usize >> 3) << 5) | (p.blue as usize >> 3);
        let bucket = &mut buckets[index];
        bucket.0 = bucket.0.saturating_add(weight);
        bucket.1 += p.red as u64;
        bucket.2 += p.green as u64;
        bucket.3 += p.blue as u64;
        bucket.4 += 1;
    }

    // Ties resolve to the lowest bucket index.
    let (_, best) = buckets
        .iter()
        .enumerate()
        .filter(|(_, bucket)| bucket.4 > 0)
        .fold(None::<(usize, &(u32, u64, u64, u64, u64))>, |best, (i, bucket)| match best {
            Some((_, current)) if current.0 >= bucket.0 => best,
            _ => Some((i, bucket)),
        })?;

    let n = best.4;
    let half = n / 2;
    Some(Pixel::opaque(
        ((best.1 + half) / n) as u8,
        ((best.2 + half) / n) as u8,
        ((best.3 + half) / n) as u8,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Pixel) -> Raster {
        let mut pixels = Vec::new();
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Raster::new(width, height, pixels)
    }

    #[test]
    fn flat_fill_has_one_color_and_no_edges() {
        let raster = raster_from_fn(30, 30, |_, _| Pixel::opaque(12, 140, 220));
        assert_eq!(quantized_color_count(&raster, COARSE_BUCKET), 1);
        assert_eq!(edge_density(&raster), 0.0);
        assert_eq!(high_contrast_edge_ratio(&raster, HIGH_CONTRAST_LUMA_STEP), 0.0);
        assert_eq!(axis_aligned_edge_bias(&raster), 0.0);
        assert_eq!(saturation_variance(&raster), 0.0);
    }

    #[test]
    fn saturation_variance_is_exact_for_flat_and_split_fills() {
        let tinted = raster_from_fn(37, 23, |_, _| Pixel::opaque(201, 87, 13));
        assert_eq!(saturation_variance(&tinted), 0.0);

        // Half fully saturated, half gray: chroma is 0 or 1 after normalizing.
        let split = raster_from_fn(10, 10, |x, _| {
            if x < 5 { Pixel::opaque(255, 0, 0) } else { Pixel::opaque(90, 90, 90) }
        });
        assert_eq!(saturation_variance(&split), 0.25);
    }

    #[test]
    fn vertical_stripes_are_axis_aligned_high_contrast_edges() {
        let raster = raster_from_fn(20, 20, |x, _| if x % 2 == 0 { Pixel::WHITE } else { Pixel::opaque(0, 0, 0) });
        assert_eq!(axis_aligned_edge_bias(&raster), 1.0);
        // Horizontal comparisons all cross a stripe, vertical ones never do.
        assert!((high_contrast_edge_ratio(&raster, HIGH_CONTRAST_LUMA_STEP) - 0.5).abs() < 1e-9);
        assert!(edge_density(&raster) > 25.0);
    }

    #[test]
    fn diagonal_gradient_is_not_axis_aligned() {
        let raster = raster_from_fn(20, 20, |x, y| {
            let v = ((x + y) * 30).min(255) as u8;
            Pixel::opaque(v, v, v)
        });
        assert_eq!(axis_aligned_edge_bias(&raster), 0.0);
    }

    #[test]
    fn border_strip_reads_the_frame() {
        let raster = raster_from_fn(20, 20, |x, y| {
            if (2..18).contains(&x) && (2..18).contains(&y) { Pixel::opaque(255, 0, 0) } else { Pixel::opaque(0, 0, 255) }
        });
        assert_eq!(border_strip_color(&raster, 2), Pixel::opaque(0, 0, 255));
    }

    #[test]
    fn dominant_color_prefers_the_mark_over_the_background() {
        let raster = raster_from_fn(20, 20, |x, y| {
            if (5..15).contains(&x) && (5..15).contains(&y) { Pixel::opaque(220, 30, 40) } else { Pixel::WHITE }
        });
        assert_eq!(dominant_color(&raster), Some(Pixel::opaque(220, 30, 40)));
        let blank = raster_from_fn(5, 5, |_, _| Pixel::WHITE);
        assert_eq!(dominant_color(&blank), None);
    }
}
