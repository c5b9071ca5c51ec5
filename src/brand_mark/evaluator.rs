// THEORY:
// Scoring of one brand-mark candidate. `analyze_brand_mark` is a pure function of the
// decoded image and the configuration; `evaluate_brand_candidate` wraps it with the
// platform-default pre-filter, a bounded fetch, and a blocking-pool hop for the pixel
// work. Every path ends in an `AnalysisResult`: failures become disqualifications.
//
// Score = weighted sub-scores x photo penalty.
// - aspect:        100 x short/long side
// - resolution:    tiered on the long side
// - complexity:    tiered on the coarse quantized color count
// - source trust:  fixed per source tag
// - not monogram:  100 x (1 - single-glyph confidence)
// Photo penalty: three photographic signals (busy edges, no flat background, many
// colors). All three -> strong penalty, two -> mild, fewer -> none.

use crate::assets::analysis::{AnalysisResult, Criterion, Dimensions};
use crate::assets::candidate::Candidate;
use crate::assets::fetch::{AssetFetcher, fetch_with_timeout};
use crate::assets::imaging;
use crate::color::Rgb;
use crate::config::{BrandMarkConfig, EngineConfig};
use crate::core_modules::activity_grid::GRID_SIZE;
use crate::core_modules::raster::{Raster, THUMBNAIL_SIZE};
use crate::core_modules::region::{
    FLOOD_TOLERANCE, FOREGROUND_LUMA_THRESHOLD, background_fraction, corner_background, foreground_bounds,
    foreground_column_runs,
};
use crate::core_modules::statistics::{COARSE_BUCKET, dominant_color, edge_density, quantized_color_count};
use image::{DynamicImage, GenericImageView};
use std::collections::BTreeMap;
use tracing::debug;

/// Above this many coarse colors a mark is not a flat glyph.
pub const MONOGRAM_MAX_COLORS: usize = 4;
pub const PHOTO_EDGE_DENSITY: f64 = 25.0;
pub const PHOTO_BACKGROUND_FRACTION: f64 = 0.15;
pub const PHOTO_COLOR_COUNT: usize = 30;
/// A flat icon background at least this saturated is the brand color itself.
const MIN_BACKGROUND_BRAND_SATURATION: f64 = 0.25;

/// A scored candidate together with its decoded pixels (absent when it never decoded).
#[derive(Debug, Clone)]
pub struct EvaluatedMark {
    pub result: AnalysisResult,
    pub image: Option<DynamicImage>,
}

/// The first configured platform-default pattern contained in the URL, case-insensitively.
pub fn matched_platform_default<'a>(url: &str, patterns: &'a [String]) -> Option<&'a str> {
    let url = url.to_lowercase();
    patterns
        .iter()
        .map(String::as_str)
        .find(|pattern| !pattern.is_empty() && url.contains(&pattern.to_lowercase()))
}

pub fn aspect_score(dimensions: Dimensions) -> f64 {
    if dimensions.long_side() == 0 {
        return 0.0;
    }
    100.0 * dimensions.short_side() as f64 / dimensions.long_side() as f64
}

pub fn resolution_score(long_side: u32) -> f64 {
    match long_side {
        256..=u32::MAX => 100.0,
        128..=255 => 85.0,
        64..=127 => 65.0,
        32..=63 => 40.0,
        _ => 20.0,
    }
}

pub fn complexity_score(colors: usize) -> f64 {
    match colors {
        0..=1 => 10.0,
        2..=3 => 50.0,
        4..=10 => 80.0,
        11..=30 => 100.0,
        _ => 70.0,
    }
}

/// Confidence (0..1) that the raster is a single glyph on a flat background.
///
/// Four equally weighted signals, only considered for flat art: the foreground is
/// centered, forms one column run, is stroke-like rather than solid, and occupies a
/// glyph-sized share of the frame.
pub fn monogram_confidence(raster: &Raster, colors: usize) -> f64 {
    if colors > MONOGRAM_MAX_COLORS {
        return 0.0;
    }
    let Some(bounds) = foreground_bounds(raster, FOREGROUND_LUMA_THRESHOLD) else {
        return 0.0;
    };
    let min_gap = (raster.width / GRID_SIZE).max(1);
    let runs = foreground_column_runs(raster, FOREGROUND_LUMA_THRESHOLD, min_gap);

    let signals = [
        bounds.center_offset < 0.15,
        runs.len() == 1,
        bounds.fill_ratio < 0.6,
        (0.08..=0.7).contains(&bounds.area_ratio),
    ];
    signals.iter().filter(|s| **s).count() as f64 / signals.len() as f64
}

/// Photo penalty factor and how many photographic signals fired.
pub fn photo_penalty(edge: f64, background: f64, colors: usize, config: &BrandMarkConfig) -> (f64, usize) {
    let signals = [
        edge > PHOTO_EDGE_DENSITY,
        background < PHOTO_BACKGROUND_FRACTION,
        colors >= PHOTO_COLOR_COUNT,
    ]
    .iter()
    .filter(|s| **s)
    .count();
    let factor = match signals {
        3 => config.photographic_factor,
        2 => config.ambiguous_photo_factor,
        _ => 1.0,
    };
    (factor, signals)
}

/// The mark's brand color: its dominant saturated color, or a saturated flat background
/// when the glyph itself is neutral (white letter on a colored tile).
pub fn brand_color(raster: &Raster) -> Option<Rgb> {
    let glyph = dominant_color(raster).map(Rgb::from);
    let background = Rgb::from(corner_background(raster));
    let background_saturation = background.saturation();
    match glyph {
        Some(glyph) if glyph.saturation() >= background_saturation => Some(glyph),
        _ if background_saturation >= MIN_BACKGROUND_BRAND_SATURATION => Some(background),
        other => other,
    }
}

/// Scores a decoded candidate. Never fails.
pub fn analyze_brand_mark(candidate: Candidate, image: &DynamicImage, config: &BrandMarkConfig) -> AnalysisResult {
    let weights = config.weights.entries();
    let (width, height) = image.dimensions();
    let dimensions = Dimensions { width, height };

    if dimensions.long_side() < config.min_dimension {
        return AnalysisResult::disqualified(
            candidate,
            Some(dimensions),
            &weights,
            format!(
                "too small: {width}x{height} below {}px",
                config.min_dimension
            ),
        );
    }

    let raster = Raster::thumbnail(image, THUMBNAIL_SIZE);
    let colors = quantized_color_count(&raster, COARSE_BUCKET);
    let edge = edge_density(&raster);
    let background = background_fraction(&raster, FLOOD_TOLERANCE);
    let monogram = monogram_confidence(&raster, colors);
    let (penalty, photo_signals) = photo_penalty(edge, background, colors, config);

    let sub_scores = BTreeMap::from([
        (Criterion::Aspect, aspect_score(dimensions)),
        (Criterion::Resolution, resolution_score(dimensions.long_side())),
        (Criterion::Complexity, complexity_score(colors)),
        (Criterion::SourceTrust, candidate.source.brand_trust()),
        (Criterion::NotMonogram, 100.0 * (1.0 - monogram)),
    ]);

    AnalysisResult::scored(candidate, dimensions, &weights, sub_scores, penalty)
        .with_metric("color_count", colors as f64)
        .with_metric("edge_density", edge)
        .with_metric("background_fraction", background)
        .with_metric("monogram_confidence", monogram)
        .with_metric("photo_signals", photo_signals as f64)
        .with_dominant_color(brand_color(&raster))
}

/// Pre-filters, fetches, decodes and scores one candidate.
pub async fn evaluate_brand_candidate(
    candidate: Candidate,
    fetcher: &dyn AssetFetcher,
    config: &EngineConfig,
) -> EvaluatedMark {
    let weights = config.brand_mark.weights.entries();
    let reject = |candidate: Candidate, reason: String| {
        debug!(url = %candidate.url, %reason, "brand mark disqualified");
        EvaluatedMark {
            result: AnalysisResult::disqualified(candidate, None, &weights, reason),
            image: None,
        }
    };

    if let Some(pattern) = matched_platform_default(&candidate.url, &config.brand_mark.platform_default_patterns) {
        return reject(candidate, format!("platform default favicon ({pattern})"));
    }

    let bytes = match fetch_with_timeout(fetcher, &candidate.url, config.fetch.timeout()).await {
        Ok(bytes) => bytes,
        Err(err) => return reject(candidate, err.to_string()),
    };

    let brand_config = config.brand_mark.clone();
    let task_candidate = candidate.clone();
    let analysis = tokio::task::spawn_blocking(move || {
        imaging::decode(&bytes).map(|image| {
            let result = analyze_brand_mark(task_candidate, &image, &brand_config);
            (result, image)
        })
    })
    .await;

    match analysis {
        Ok(Ok((result, image))) => {
            debug!(
                url = %result.candidate.url,
                score = result.total_score,
                disqualified = result.is_disqualified(),
                "brand mark evaluated"
            );
            EvaluatedMark {
                result,
                image: Some(image),
            }
        }
        Ok(Err(err)) => reject(candidate, err.to_string()),
        Err(join_err) => reject(candidate, crate::error::AssetError::from(join_err).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::candidate::SourceTag;
    use image::{Rgba, RgbaImage};

    fn candidate(source: SourceTag) -> Candidate {
        Candidate::new("https://brand.test/icon.png", source)
    }

    /// Two overlapping disks on white: a flat, two-color, non-glyph mark.
    fn badge(side: u32) -> DynamicImage {
        let s = side as f64;
        DynamicImage::ImageRgba8(RgbaImage::from_fn(side, side, |x, y| {
            let (fx, fy) = (x as f64 + 0.5, y as f64 + 0.5);
            let in_left = (fx - s * 0.35).powi(2) + (fy - s * 0.5).powi(2) < (s * 0.28).powi(2);
            let in_right = (fx - s * 0.65).powi(2) + (fy - s * 0.5).powi(2) < (s * 0.28).powi(2);
            match (in_left, in_right) {
                (true, _) => Rgba([220, 38, 38, 255]),
                (false, true) => Rgba([37, 99, 235, 255]),
                _ => Rgba([255, 255, 255, 0]),
            }
        }))
    }

    /// Smooth, full-frame color texture: every photographic signal fires.
    fn photo(side: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(side, side, |x, y| {
            let (fx, fy) = (x as f64, y as f64);
            Rgba([
                (128.0 + 120.0 * (fx / 3.1).sin()) as u8,
                (128.0 + 120.0 * (fy / 2.3 + fx / 5.0).cos()) as u8,
                (128.0 + 120.0 * ((fx + fy) / 4.1).sin()) as u8,
                255,
            ])
        }))
    }

    #[test]
    fn platform_defaults_match_case_insensitively() {
        let patterns = vec!["wix.com/favicon".to_string()];
        assert_eq!(
            matched_platform_default("https://WWW.WIX.COM/favicon.ico", &patterns),
            Some("wix.com/favicon")
        );
        assert_eq!(matched_platform_default("https://acme.test/favicon.ico", &patterns), None);
    }

    #[test]
    fn tracking_pixels_are_disqualified() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255])));
        let result = analyze_brand_mark(candidate(SourceTag::Logo), &image, &BrandMarkConfig::default());
        assert!(result.is_disqualified());
        assert_eq!(result.total_score, 0.0);
        assert!(result.sub_scores.values().all(|v| *v == 0.0));
    }

    #[test]
    fn flat_badge_is_unpenalized_and_admissible() {
        let config = BrandMarkConfig::default();
        let result = analyze_brand_mark(candidate(SourceTag::Favicon), &badge(64), &config);
        assert_eq!(result.penalty_factor, 1.0);
        assert!(result.is_admissible(config.min_viable_score), "{result:#?}");
        assert_eq!(result.sub_scores[&Criterion::Aspect], 100.0);
        assert_eq!(result.sub_scores[&Criterion::Resolution], 65.0);
    }

    #[test]
    fn photographs_take_the_strong_penalty() {
        let config = BrandMarkConfig::default();
        let result = analyze_brand_mark(candidate(SourceTag::Logo), &photo(128), &config);
        assert_eq!(result.penalty_factor, config.photographic_factor);
    }

    #[test]
    fn two_photo_signals_take_the_ambiguous_penalty() {
        let config = BrandMarkConfig::default();
        // Busy edges and many colors, but a clear background.
        assert_eq!(photo_penalty(30.0, 0.5, 40, &config), (config.ambiguous_photo_factor, 2));
        // Little background and many colors on a smooth image.
        assert_eq!(photo_penalty(10.0, 0.05, 64, &config), (config.ambiguous_photo_factor, 2));
        assert_eq!(photo_penalty(30.0, 0.05, 40, &config), (config.photographic_factor, 3));
        assert_eq!(photo_penalty(30.0, 0.5, 12, &config), (1.0, 1));
        assert_eq!(config.ambiguous_photo_factor, 0.7);
    }

    #[test]
    fn scoring_is_deterministic() {
        let config = BrandMarkConfig::default();
        let a = analyze_brand_mark(candidate(SourceTag::Favicon), &badge(96), &config);
        let b = analyze_brand_mark(candidate(SourceTag::Favicon), &badge(96), &config);
        assert_eq!(a.total_score.to_bits(), b.total_score.to_bits());
        assert_eq!(a.dominant_color, b.dominant_color);
    }

    #[test]
    fn white_glyph_on_colored_tile_reports_the_tile() {
        let tile = DynamicImage::ImageRgba8(RgbaImage::from_fn(48, 48, |x, y| {
            if (18..30).contains(&x) && (10..38).contains(&y) {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([22, 163, 74, 255])
            }
        }));
        let raster = Raster::thumbnail(&tile, THUMBNAIL_SIZE);
        assert_eq!(brand_color(&raster), Some(Rgb::new(22, 163, 74)));
    }

    #[tokio::test]
    async fn fetch_failures_become_disqualifications() {
        let fetcher = crate::assets::fetch::MemoryFetcher::new()
            .with("https://brand.test/broken.png", b"not an image".to_vec());
        let config = EngineConfig::default();

        let missing = evaluate_brand_candidate(
            Candidate::new("https://brand.test/missing.png", SourceTag::Logo),
            &fetcher,
            &config,
        )
        .await;
        assert!(missing.result.disqualify_reason().unwrap().contains("404"));

        let broken = evaluate_brand_candidate(
            Candidate::new("https://brand.test/broken.png", SourceTag::Logo),
            &fetcher,
            &config,
        )
        .await;
        assert!(broken.result.is_disqualified());
        assert!(broken.image.is_none());
    }
}
