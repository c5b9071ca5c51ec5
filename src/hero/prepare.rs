// THEORY:
// Turns the selected hero pick into what a preview renders: a shrink-only resize to the
// output bound, a JPEG `data:` URL, the average border color (used to letterbox the
// image without a visible seam) and an orientation tag. When there is no pick, or the
// pick cannot be re-encoded, the page domain seeds a deterministic gradient instead.

use crate::assets::imaging::{self, JPEG_MIME};
use crate::color::Rgb;
use crate::color::palette::gradient_for;
use crate::config::HeroConfig;
use crate::core_modules::raster::Raster;
use crate::core_modules::statistics::border_strip_color;
use crate::error::AssetResult;
use crate::hero::classifier::ContentType;
use crate::hero::evaluator::HeroPick;
use image::GenericImageView;
use serde::Serialize;
use tracing::warn;

/// Width and height within this relative difference are tagged square.
const SQUARE_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

impl Orientation {
    pub fn of(width: u32, height: u32) -> Self {
        let long = width.max(height).max(1) as f64;
        if (width as f64 - height as f64).abs() / long <= SQUARE_TOLERANCE {
            Orientation::Square
        } else if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeroImageResult {
    Found {
        url: String,
        data_url: String,
        width: u32,
        height: u32,
        orientation: Orientation,
        content: ContentType,
        confidence: f64,
        edge_color: Rgb,
        score: f64,
    },
    Gradient {
        angle: u16,
        from: Rgb,
        to: Rgb,
        css: String,
    },
}

impl HeroImageResult {
    pub fn gradient(seed: &str) -> Self {
        let gradient = gradient_for(seed);
        HeroImageResult::Gradient {
            angle: gradient.angle,
            from: gradient.from,
            to: gradient.to,
            css: gradient.css,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, HeroImageResult::Found { .. })
    }
}

/// Resizes, encodes and samples a picked hero image.
pub fn prepare_hero(pick: HeroPick, config: &HeroConfig) -> AssetResult<HeroImageResult> {
    let resized = imaging::resize_to_fit(pick.image, config.max_output_dimension);
    let (width, height) = resized.dimensions();
    let bytes = imaging::encode_jpeg(&resized, config.jpeg_quality)?;

    let strip = ((width.min(height) as f64 * config.edge_strip_fraction).round() as u32).max(1);
    let edge = border_strip_color(&Raster::from_rgba(&resized.to_rgba8()), strip);

    Ok(HeroImageResult::Found {
        url: pick.result.candidate.url,
        data_url: imaging::to_data_url(JPEG_MIME, &bytes),
        width,
        height,
        orientation: Orientation::of(width, height),
        content: pick.classification.content,
        confidence: pick.classification.confidence,
        edge_color: Rgb::from(edge),
        score: pick.result.total_score,
    })
}

/// The prepared pick, or the domain gradient when there is none or preparation fails.
pub fn hero_or_gradient(pick: Option<HeroPick>, domain: &str, config: &HeroConfig) -> HeroImageResult {
    let Some(pick) = pick else {
        return HeroImageResult::gradient(domain);
    };
    let url = pick.result.candidate.url.clone();
    match prepare_hero(pick, config) {
        Ok(found) => found,
        Err(err) => {
            warn!(%url, error = %err, "hero preparation failed, using gradient");
            HeroImageResult::gradient(domain)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::analysis::{AnalysisResult, Criterion, Dimensions};
    use crate::assets::candidate::{Candidate, SourceTag};
    use crate::hero::classifier::Classification;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::collections::BTreeMap;

    fn pick(image: DynamicImage) -> HeroPick {
        let (width, height) = image.dimensions();
        HeroPick {
            result: AnalysisResult::scored(
                Candidate::new("https://site.test/hero.jpg", SourceTag::OpenGraph),
                Dimensions { width, height },
                &[(Criterion::Resolution, 1.0)],
                BTreeMap::from([(Criterion::Resolution, 85.0)]),
                1.0,
            ),
            classification: Classification {
                content: ContentType::Photo,
                confidence: 0.8,
                points: 10.0,
                signals: Vec::new(),
            },
            image,
        }
    }

    /// Red frame around a blue interior.
    fn framed(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            if x < 40 || y < 40 || x >= width - 40 || y >= height - 40 {
                Rgba([200, 30, 30, 255])
            } else {
                Rgba([20, 40, 200, 255])
            }
        }))
    }

    #[test]
    fn orientation_has_a_square_band() {
        assert_eq!(Orientation::of(1000, 980), Orientation::Square);
        assert_eq!(Orientation::of(1200, 800), Orientation::Landscape);
        assert_eq!(Orientation::of(800, 1200), Orientation::Portrait);
    }

    #[test]
    fn large_picks_are_shrunk_and_encoded() {
        let config = HeroConfig::default();
        let result = prepare_hero(pick(framed(3200, 1600)), &config).unwrap();
        let HeroImageResult::Found {
            width,
            height,
            data_url,
            edge_color,
            orientation,
            ..
        } = result
        else {
            panic!("expected a found hero");
        };
        assert_eq!((width, height), (1600, 800));
        assert_eq!(orientation, Orientation::Landscape);
        assert!(data_url.starts_with("data:image/jpeg;base64,"));
        assert!(edge_color.r > 150 && edge_color.b < 80, "{edge_color}");
    }

    #[test]
    fn small_picks_are_not_upscaled() {
        let result = prepare_hero(pick(framed(800, 600)), &HeroConfig::default()).unwrap();
        assert!(matches!(result, HeroImageResult::Found { width: 800, height: 600, .. }));
    }

    #[test]
    fn no_pick_is_a_stable_gradient() {
        let config = HeroConfig::default();
        let a = hero_or_gradient(None, "example.com", &config);
        let b = hero_or_gradient(None, "  Example.com ", &config);
        assert_eq!(a, b);
        assert!(matches!(a, HeroImageResult::Gradient { angle, .. } if angle < 360));
    }
}
