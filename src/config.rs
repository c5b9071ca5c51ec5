// THEORY:
// Every tunable number in the engine lives here. The pipelines never inline a
// threshold: minimum sizes, pass thresholds, weight sets, preference buffers and the
// iteration budget of the color gate are all fields of `EngineConfig`, so tests can
// probe boundary values by building a config instead of patching algorithm code.
//
// Defaults are the empirically tuned values. They are loaded with `#[serde(default)]`
// so a JSON file only needs to name the fields it overrides.

use crate::assets::analysis::Criterion;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard upper bound on color-gate repair passes.
pub const MAX_ITERATIONS: u32 = 3;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Top-level configuration for the whole engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fetch: FetchConfig,
    pub brand_mark: BrandMarkConfig,
    pub hero: HeroConfig,
    pub color_gate: ColorGateConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects weight sets that do not sum to 1.0 and thresholds outside their domain.
    pub fn validate(&self) -> ConfigResult<()> {
        check_weights("brand_mark", &self.brand_mark.weights.entries())?;
        check_weights("hero", &self.hero.weights.entries())?;

        if self.fetch.max_concurrent == 0 {
            return Err(ConfigError::threshold("max_concurrent", "must be at least 1"));
        }
        check_score("brand_mark.min_viable_score", self.brand_mark.min_viable_score)?;
        check_score("hero.pass_threshold", self.hero.pass_threshold)?;
        check_score("hero.text_heavy_threshold", self.hero.text_heavy_threshold)?;
        check_factor("brand_mark.ambiguous_photo_factor", self.brand_mark.ambiguous_photo_factor)?;
        check_factor("brand_mark.photographic_factor", self.brand_mark.photographic_factor)?;

        if !(0.0..=1.0).contains(&self.color_gate.monochrome_page_min_share) {
            return Err(ConfigError::threshold(
                "color_gate.monochrome_page_min_share",
                "must be within 0..=1",
            ));
        }
        if self.hero.max_portrait_ratio < 1.0 {
            return Err(ConfigError::threshold("hero.max_portrait_ratio", "must be at least 1.0"));
        }
        if self.hero.max_output_dimension == 0 || self.brand_mark.output_size == 0 {
            return Err(ConfigError::threshold("output size", "must be non-zero"));
        }
        if self.color_gate.max_iterations > MAX_ITERATIONS {
            return Err(ConfigError::threshold(
                "color_gate.max_iterations",
                format!("must not exceed {MAX_ITERATIONS}"),
            ));
        }
        Ok(())
    }
}

fn check_weights(pipeline: &'static str, entries: &[(Criterion, f64)]) -> ConfigResult<()> {
    let sum: f64 = entries.iter().map(|(_, weight)| weight).sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE || entries.iter().any(|(_, w)| *w < 0.0) {
        return Err(ConfigError::WeightSum { pipeline, sum });
    }
    Ok(())
}

fn check_score(name: &'static str, value: f64) -> ConfigResult<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::threshold(name, format!("{value} is outside 0..=100")));
    }
    Ok(())
}

fn check_factor(name: &'static str, value: f64) -> ConfigResult<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(ConfigError::threshold(name, format!("{value} is outside (0, 1]")));
    }
    Ok(())
}

/// Network limits applied to every candidate fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_ms: u64,
    pub max_bytes: usize,
    pub user_agent: String,
    /// How many candidates are fetched and analyzed at once.
    pub max_concurrent: usize,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 4_000,
            max_bytes: 8 * 1024 * 1024,
            user_agent: "AssetGate/0.1 (brand preview)".to_string(),
            max_concurrent: num_cpus::get().max(2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandMarkWeights {
    pub aspect: f64,
    pub resolution: f64,
    pub complexity: f64,
    pub source_trust: f64,
    pub not_monogram: f64,
}

impl BrandMarkWeights {
    pub fn entries(&self) -> [(Criterion, f64); 5] {
        [
            (Criterion::Aspect, self.aspect),
            (Criterion::Resolution, self.resolution),
            (Criterion::Complexity, self.complexity),
            (Criterion::SourceTrust, self.source_trust),
            (Criterion::NotMonogram, self.not_monogram),
        ]
    }
}

impl Default for BrandMarkWeights {
    fn default() -> Self {
        Self {
            aspect: 0.25,
            resolution: 0.20,
            complexity: 0.20,
            source_trust: 0.15,
            not_monogram: 0.20,
        }
    }
}

/// Thresholds for the brand-mark selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandMarkConfig {
    /// Candidates whose largest side is below this are tracking pixels.
    pub min_dimension: u32,
    pub min_viable_score: f64,
    /// A non-favicon winner must beat the favicon by at least this much.
    pub favicon_preference_buffer: f64,
    pub max_manifest_icons: usize,
    /// Side length of the normalized square output.
    pub output_size: u32,
    /// Width/height ratio at which a mark is treated as a wordmark and cropped.
    pub wide_wordmark_ratio: f64,
    pub ambiguous_photo_factor: f64,
    pub photographic_factor: f64,
    /// Lowercase URL fragments of hosting-provider stock favicons.
    pub platform_default_patterns: Vec<String>,
    pub weights: BrandMarkWeights,
}

impl Default for BrandMarkConfig {
    fn default() -> Self {
        Self {
            min_dimension: 16,
            min_viable_score: 40.0,
            favicon_preference_buffer: 15.0,
            max_manifest_icons: 2,
            output_size: 128,
            wide_wordmark_ratio: 2.5,
            ambiguous_photo_factor: 0.7,
            photographic_factor: 0.35,
            platform_default_patterns: [
                "static.wixstatic.com/media/ficon",
                "wix.com/favicon",
                "squarespace.com/universal/default-favicon",
                "assets.squarespace.com/universal/default",
                "s0.wp.com/i/webclip",
                "s.w.org/favicon",
                "wp-includes/images/w-logo",
                "cdn.shopify.com/shopifycloud/web/assets/v1/favicon-default",
                "webflow.com/img/favicon",
                "weebly.com/favicon",
                "img1.wsimg.com/isteam/ip/static/favicon",
                "framerusercontent.com/images/default",
                "ghost.org/favicon",
                "github.githubassets.com/favicons/favicon",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            weights: BrandMarkWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroWeights {
    pub resolution: f64,
    pub aspect: f64,
    pub complexity: f64,
    pub area: f64,
    pub edge_density: f64,
    pub spatial_spread: f64,
}

impl HeroWeights {
    pub fn entries(&self) -> [(Criterion, f64); 6] {
        [
            (Criterion::Resolution, self.resolution),
            (Criterion::Aspect, self.aspect),
            (Criterion::Complexity, self.complexity),
            (Criterion::Area, self.area),
            (Criterion::EdgeDensity, self.edge_density),
            (Criterion::SpatialSpread, self.spatial_spread),
        ]
    }
}

impl Default for HeroWeights {
    fn default() -> Self {
        Self {
            resolution: 0.20,
            aspect: 0.15,
            complexity: 0.15,
            area: 0.10,
            edge_density: 0.20,
            spatial_spread: 0.20,
        }
    }
}

/// Hard gates, scoring and classification thresholds for hero images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    pub min_long_side: u32,
    pub min_short_side: u32,
    /// `height > width * max_portrait_ratio` is rejected outright.
    pub max_portrait_ratio: f64,
    pub min_color_count: usize,
    pub min_edge_density: f64,
    pub min_spatial_spread: f64,
    pub pass_threshold: f64,
    pub text_heavy_threshold: f64,
    /// Width/height at or above which an image is text-heavy without further analysis.
    pub wide_text_aspect: f64,
    /// Width/height at or below which an image is a photo without further analysis.
    pub tall_photo_aspect: f64,
    pub max_fallback_candidates: usize,
    pub max_output_dimension: u32,
    pub jpeg_quality: u8,
    /// Thickness of the border strip sampled for the letterbox color, as a fraction of the short side.
    pub edge_strip_fraction: f64,
    pub weights: HeroWeights,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            min_long_side: 400,
            min_short_side: 200,
            max_portrait_ratio: 1.2,
            min_color_count: 12,
            min_edge_density: 4.0,
            min_spatial_spread: 0.3,
            pass_threshold: 70.0,
            text_heavy_threshold: 45.0,
            wide_text_aspect: 3.0,
            tall_photo_aspect: 0.85,
            max_fallback_candidates: 5,
            max_output_dimension: 1600,
            jpeg_quality: 85,
            edge_strip_fraction: 0.02,
            weights: HeroWeights::default(),
        }
    }
}

/// Rule thresholds for the color-scheme quality gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorGateConfig {
    pub max_iterations: u32,
    pub min_text_contrast: f64,
    pub min_accent_saturation: f64,
    /// Below this saturation a mid-lightness sidebar reads as washed-out gray.
    pub washed_out_saturation: f64,
    /// Below this saturation a color counts as neutral.
    pub neutral_saturation: f64,
    pub hue_tolerance: f64,
    /// Colors below this saturation are exempt from the hue-harmony rule.
    pub harmony_exempt_saturation: f64,
    pub distinct_luminance_gap: f64,
    pub distinct_hue_gap: f64,
    pub strong_brand_saturation: f64,
    pub brand_hue_tolerance: f64,
    pub saturated_brand_saturation: f64,
    pub saturated_brand_hue_tolerance: f64,
    pub template_neutral_share: f64,
    pub template_sidebar_saturation: f64,
    pub template_accent_saturation: f64,
    pub high_confidence_accent: f64,
    pub button_min_contrast: f64,
    pub monochrome_brand_saturation: f64,
    pub monochrome_page_saturation: f64,
    /// Saturated page colors below this share of total usage do not defeat monochrome.
    pub monochrome_page_min_share: f64,
    pub true_neutral_saturation: f64,
}

impl Default for ColorGateConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            min_text_contrast: 4.5,
            min_accent_saturation: 0.25,
            washed_out_saturation: 0.12,
            neutral_saturation: 0.12,
            hue_tolerance: 60.0,
            harmony_exempt_saturation: 0.15,
            distinct_luminance_gap: 0.08,
            distinct_hue_gap: 30.0,
            strong_brand_saturation: 0.30,
            brand_hue_tolerance: 25.0,
            saturated_brand_saturation: 0.50,
            saturated_brand_hue_tolerance: 30.0,
            template_neutral_share: 0.70,
            template_sidebar_saturation: 0.20,
            template_accent_saturation: 0.30,
            high_confidence_accent: 0.70,
            button_min_contrast: 3.0,
            monochrome_brand_saturation: 0.10,
            monochrome_page_saturation: 0.15,
            monochrome_page_min_share: 0.05,
            true_neutral_saturation: 0.05,
        }
    }
}
