// THEORY:
// Region growing over a raster. Two questions are answered here:
//
// 1.  **How much of the image is one flat background?** A breadth-first flood fill is
//     seeded at each of the four corners and grows through 4-connected neighbors while
//     their color stays within a tolerance of that corner's seed. The union of the four
//     fills, as a fraction of the raster, approximates background uniformity. Logos on
//     solid backgrounds and text slides score high; photographs score near zero.
// 2.  **Where is the foreground?** Pixels are binarized against the mean corner
//     luminance and the tight bounding box of the foreground is measured. Small,
//     centered, sparsely filled content is the signature of a single glyph.
//
// Both are stateless utilities over a single raster.

use crate::core_modules::pixel::{Channel, Luminance, Pixel};
use crate::core_modules::raster::{Dimension, Raster};
use std::collections::VecDeque;

/// Share of a frame or box, 0..1.
pub type Fraction = f64;
/// Half-open column span `[start, end)`.
pub type ColumnRun = (Dimension, Dimension);

/// Maximum per-channel distance from the seed for a pixel to join a background fill.
pub const FLOOD_TOLERANCE: Channel = 24;
/// Luma distance from the background at which a pixel counts as foreground.
pub const FOREGROUND_LUMA_THRESHOLD: Luminance = 48.0;

/// Fraction (0..1) of the raster reachable from the corners through near-seed colors.
pub fn background_fraction(raster: &Raster, tolerance: Channel) -> Fraction {
    if raster.is_empty() {
        return 0.0;
    }
    let mut visited = vec![false; raster.pixel_count()];
    let mut filled = 0usize;
    let (w, h) = (raster.width, raster.height);

    for (seed_x, seed_y) in [(0, 0), (w - 1, 0), (w - 1, h - 1), (0, h - 1)] {
        let start = raster.index(seed_x, seed_y);
        if visited[start] {
            continue;
        }
        let seed = raster.get(seed_x, seed_y);
        let mut queue = VecDeque::from([(seed_x, seed_y)]);
        visited[start] = true;

        while let Some((x, y)) = queue.pop_front() {
            filled += 1;
            for (dx, dy) in [(0i64, 1i64), (0, -1), (1, 0), (-1, 0)] {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);
                let index = raster.index(nx, ny);
                if !visited[index] && raster.get(nx, ny).max_channel_distance(&seed) <= tolerance {
                    visited[index] = true;
                    queue.push_back((nx, ny));
                }
            }
        }
    }

    filled as Fraction / raster.pixel_count() as Fraction
}

/// Mean color of the four corners, used as the background estimate.
pub fn corner_background(raster: &Raster) -> Pixel {
    if raster.is_empty() {
        return Pixel::WHITE;
    }
    let corners = raster.corners();
    let mean = |f: fn(&Pixel) -> u8| -> u8 {
        ((corners.iter().map(|p| f(p) as u32).sum::<u32>() + 2) / 4) as u8
    };
    Pixel::opaque(mean(|p| p.red), mean(|p| p.green), mean(|p| p.blue))
}

/// Per-pixel foreground mask: luma differs from the background estimate by more than `threshold`.
pub fn foreground_mask(raster: &Raster, threshold: Luminance) -> Vec<bool> {
    let background = corner_background(raster).luminance();
    raster
        .pixels()
        .iter()
        .map(|p| (p.luminance() - background).abs() > threshold)
        .collect()
}

/// Tight bounding box of the foreground and how it sits in the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForegroundBounds {
    /// Top-left corner (inclusive).
    pub min: (Dimension, Dimension),
    /// Bottom-right corner (inclusive).
    pub max: (Dimension, Dimension),
    /// Bounding-box area over frame area.
    pub area_ratio: Fraction,
    /// Foreground pixels over bounding-box area.
    pub fill_ratio: Fraction,
    /// Distance of the box center from the frame center, as a fraction of the half-diagonal.
    pub center_offset: Fraction,
}

/// Measures the foreground bounding box, or `None` when nothing stands out.
pub fn foreground_bounds(raster: &Raster, threshold: Luminance) -> Option<ForegroundBounds> {
    if raster.is_empty() {
        return None;
    }
    let mask = foreground_mask(raster, threshold);
    let mut min_x = Dimension::MAX;
    let mut min_y = Dimension::MAX;
    let mut max_x: Dimension = 0;
    let mut max_y: Dimension = 0;
    let mut count = 0usize;

    for y in 0..raster.height {
        for x in 0..raster.width {
            if mask[raster.index(x, y)] {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
                count += 1;
            }
        }
    }
    if count == 0 {
        return None;
    }

    let box_w = (max_x - min_x + 1) as f64;
    let box_h = (max_y - min_y + 1) as f64;
    let frame_w = raster.width as f64;
    let frame_h = raster.height as f64;
    let box_cx = (min_x as f64 + max_x as f64 + 1.0) / 2.0;
    let box_cy = (min_y as f64 + max_y as f64 + 1.0) / 2.0;
    let dx = box_cx - frame_w / 2.0;
    let dy = box_cy - frame_h / 2.0;
    let half_diagonal = (frame_w * frame_w + frame_h * frame_h).sqrt() / 2.0;

    Some(ForegroundBounds {
        min: (min_x, min_y),
        max: (max_x, max_y),
        area_ratio: (box_w * box_h) / (frame_w * frame_h),
        fill_ratio: count as f64 / (box_w * box_h),
        center_offset: (dx * dx + dy * dy).sqrt() / half_diagonal,
    })
}

/// Horizontal runs `[start, end)` of columns that contain foreground, left to right.
///
/// Gaps narrower than `min_gap` columns are bridged so letters of one mark stay together.
pub fn foreground_column_runs(raster: &Raster, threshold: Luminance, min_gap: Dimension) -> Vec<ColumnRun> {
    if raster.is_empty() {
        return Vec::new();
    }
    let mask = foreground_mask(raster, threshold);
    let occupied: Vec<bool> = (0..raster.width)
        .map(|x| (0..raster.height).any(|y| mask[raster.index(x, y)]))
        .collect();

    let mut runs: Vec<ColumnRun> = Vec::new();
    let mut x: Dimension = 0;
    while x < raster.width {
        if !occupied[x as usize] {
            x += 1;
            continue;
        }
        let start = x;
        while x < raster.width && occupied[x as usize] {
            x += 1;
        }
        match runs.last_mut() {
            Some(last) if start - last.1 < min_gap => last.1 = x,
            _ => runs.push((start, x)),
        }
    }
    runs
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
    fn solid_raster_is_all_background() {
        let raster = raster_from_fn(20, 20, |_, _| Pixel::opaque(30, 60, 90));
        assert_eq!(background_fraction(&raster, FLOOD_TOLERANCE), 1.0);
    }

    #[test]
    fn centered_square_is_excluded_from_background() {
        let raster = raster_from_fn(20, 20, |x, y| {
            if (5..15).contains(&x) && (5..15).contains(&y) { Pixel::opaque(0, 0, 0) } else { Pixel::WHITE }
        });
        assert!((background_fraction(&raster, FLOOD_TOLERANCE) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn bounds_of_a_small_centered_glyph() {
        let raster = raster_from_fn(20, 20, |x, y| {
            if (8..12).contains(&x) && (8..12).contains(&y) { Pixel::opaque(0, 0, 0) } else { Pixel::WHITE }
        });
        let bounds = foreground_bounds(&raster, FOREGROUND_LUMA_THRESHOLD).unwrap();
        assert_eq!(bounds.min, (8, 8));
        assert_eq!(bounds.max, (11, 11));
        assert!((bounds.area_ratio - 16.0 / 400.0).abs() < 1e-9);
        assert_eq!(bounds.fill_ratio, 1.0);
        assert!(bounds.center_offset < 1e-9);
    }

    #[test]
    fn blank_raster_has_no_foreground() {
        let raster = raster_from_fn(10, 10, |_, _| Pixel::WHITE);
        assert!(foreground_bounds(&raster, FOREGROUND_LUMA_THRESHOLD).is_none());
    }

    #[test]
    fn edge_to_edge_mark_is_one_half_open_run() {
        let raster = raster_from_fn(12, 6, |_, y| {
            if (2..4).contains(&y) { Pixel::opaque(0, 0, 0) } else { Pixel::WHITE }
        });
        let expected: Vec<ColumnRun> = vec![(0, 12)];
        assert_eq!(foreground_column_runs(&raster, FOREGROUND_LUMA_THRESHOLD, 1), expected);
        let bounds = foreground_bounds(&raster, FOREGROUND_LUMA_THRESHOLD).unwrap();
        let full_width: Fraction = 2.0 / 6.0;
        assert!((bounds.area_ratio - full_width).abs() < 1e-9);
    }

    #[test]
    fn column_runs_bridge_small_gaps() {
        // Marks at columns 2..5 and 6..8 (gap of 1) and 20..30.
        let raster = raster_from_fn(40, 10, |x, _| {
            if (2..5).contains(&x) || (6..8).contains(&x) || (20..30).contains(&x) {
                Pixel::opaque(0, 0, 0)
            } else {
                Pixel::WHITE
            }
        });
        assert_eq!(foreground_column_runs(&raster, FOREGROUND_LUMA_THRESHOLD, 3), vec![(2, 8), (20, 30)]);
    }
}
