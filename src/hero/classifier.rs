// THEORY:
// Photo vs. text-heavy classification of a hero image that already passed its gates.
// Seven independent pixel signals each add points when they look like typography or UI
// chrome:
//
//   signal                         fires when          points
//   high-contrast edge ratio       > 0.12              20
//   flood-fill background          > 0.35              15
//   axis-aligned edge bias         > 0.65              15
//   quantized color count          < 25                15
//   saturation variance            < 0.02              10
//   spatial spread                 < 0.5               10
//   border / center activity       < 0.5               15
//
// A total at or above the configured threshold is text-heavy. Extreme aspect ratios
// skip the analysis: banners are text, tall crops are photos.

use crate::config::HeroConfig;
use crate::core_modules::activity_grid::ActivityGrid;
use crate::core_modules::raster::Raster;
use crate::core_modules::region::{FLOOD_TOLERANCE, background_fraction};
use crate::core_modules::statistics::{
    FINE_BUCKET, HIGH_CONTRAST_LUMA_STEP, axis_aligned_edge_bias, high_contrast_edge_ratio, quantized_color_count,
    saturation_variance,
};
use serde::Serialize;

const HIGH_CONTRAST_RATIO: f64 = 0.12;
const FLAT_BACKGROUND: f64 = 0.35;
const AXIS_BIAS: f64 = 0.65;
const FEW_COLORS: usize = 25;
const FLAT_SATURATION_VARIANCE: f64 = 0.02;
const LOW_SPREAD: f64 = 0.5;
const QUIET_BORDER: f64 = 0.5;
const TOTAL_POINTS: f64 = 100.0;
const EARLY_EXIT_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Photo,
    TextHeavy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub content: ContentType,
    /// 0.5..=1.0; grows with the distance of `points` from the threshold.
    pub confidence: f64,
    pub points: f64,
    /// Names of the signals that fired.
    pub signals: Vec<&'static str>,
}

pub fn classify(raster: &Raster, aspect_ratio: f64, config: &HeroConfig) -> Classification {
    if aspect_ratio >= config.wide_text_aspect {
        return early_exit(ContentType::TextHeavy, "wide_aspect");
    }
    if aspect_ratio <= config.tall_photo_aspect {
        return early_exit(ContentType::Photo, "tall_aspect");
    }

    let grid = ActivityGrid::standard(raster);
    let checks: [(&'static str, bool, f64); 7] = [
        (
            "high_contrast_edges",
            high_contrast_edge_ratio(raster, HIGH_CONTRAST_LUMA_STEP) > HIGH_CONTRAST_RATIO,
            20.0,
        ),
        (
            "flat_background",
            background_fraction(raster, FLOOD_TOLERANCE) > FLAT_BACKGROUND,
            15.0,
        ),
        ("axis_aligned_edges", axis_aligned_edge_bias(raster) > AXIS_BIAS, 15.0),
        ("few_colors", quantized_color_count(raster, FINE_BUCKET) < FEW_COLORS, 15.0),
        (
            "flat_saturation",
            saturation_variance(raster) < FLAT_SATURATION_VARIANCE,
            10.0,
        ),
        ("low_spread", grid.active_spread() < LOW_SPREAD, 10.0),
        ("quiet_border", grid.border_center_ratio() < QUIET_BORDER, 15.0),
    ];

    let mut points = 0.0;
    let mut signals = Vec::new();
    for (name, fired, weight) in checks {
        if fired {
            points += weight;
            signals.push(name);
        }
    }

    let threshold = config.text_heavy_threshold;
    let (content, span) = if points >= threshold {
        (ContentType::TextHeavy, TOTAL_POINTS - threshold)
    } else {
        (ContentType::Photo, threshold)
    };
    let distance = if span > 0.0 { (points - threshold).abs() / span } else { 1.0 };
    Classification {
        content,
        confidence: (0.5 + 0.5 * distance).clamp(0.5, 1.0),
        points,
        signals,
    }
}

fn early_exit(content: ContentType, signal: &'static str) -> Classification {
    Classification {
        content,
        confidence: EARLY_EXIT_CONFIDENCE,
        points: 0.0,
        signals: vec![signal],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::Pixel;

    fn raster_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Pixel) -> Raster {
        let mut pixels = Vec::new();
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Raster::new(width, height, pixels)
    }

    /// Lines of dark "words" centered on white.
    fn slide() -> Raster {
        raster_from_fn(50, 50, |x, y| {
            let in_text = (12..38).contains(&y) && (10..40).contains(&x);
            if in_text && (y - 12) % 5 < 2 && (x - 10) % 6 < 4 {
                Pixel::opaque(20, 20, 20)
            } else {
                Pixel::WHITE
            }
        })
    }

    fn landscape() -> Raster {
        raster_from_fn(50, 50, |x, y| {
            let (fx, fy) = (x as f64, y as f64);
            Pixel::opaque(
                (128.0 + 110.0 * (fx / 2.0).sin()) as u8,
                (128.0 + 110.0 * (fy / 1.7 + fx / 4.0).cos()) as u8,
                (128.0 + 110.0 * ((fx + fy) / 3.3).sin()) as u8,
            )
        })
    }

    #[test]
    fn slides_are_text_heavy() {
        let result = classify(&slide(), 1.6, &HeroConfig::default());
        assert_eq!(result.content, ContentType::TextHeavy);
        assert!(result.points >= 45.0);
        assert!(result.signals.contains(&"flat_background"));
    }

    #[test]
    fn textures_are_photos() {
        let result = classify(&landscape(), 1.6, &HeroConfig::default());
        assert_eq!(result.content, ContentType::Photo);
        assert!(result.confidence > 0.5);
    }

    #[test]
    fn extreme_aspects_short_circuit() {
        let config = HeroConfig::default();
        let banner = classify(&landscape(), 3.2, &config);
        assert_eq!(banner.content, ContentType::TextHeavy);
        assert_eq!(banner.confidence, 0.9);
        let tall = classify(&slide(), 0.8, &config);
        assert_eq!(tall.content, ContentType::Photo);
    }
}
