// THEORY:
// The `pipeline` module is the top-level API of the engine. One `AssetPipeline` takes
// everything scraped from a page (`PageAssets`) and produces one `AssetReport`:
//
// Stage 1: brand-mark selection and hero selection run concurrently; each fans out
//          its own candidate evaluations.
// Stage 2: the hero pick is prepared (or replaced by the domain gradient).
// Stage 3: the color evidence is assembled from the page colors and from the brand
//          colors the brand stage measured, a scheme is proposed, and the quality gate
//          validates and repairs it.
//
// The pipeline owns no state across runs. It never fails on page content; the only
// error is an invalid configuration, reported once by `new`.

use crate::assets::analysis::{AnalysisResult, Dimensions};
use crate::assets::candidate::{Candidate, SourceTag};
use crate::assets::fetch::AssetFetcher;
use crate::brand_mark::{SelectionResult, initials, select_brand_mark};
use crate::color::{
    AccentSource, ColorContext, ColorScheme, PageColor, QualityGateReport, Rgb, propose_scheme, validate_and_fix,
};
use crate::config::EngineConfig;
use crate::error::ConfigResult;
use crate::hero::{HeroEvaluation, HeroImageResult, hero_or_gradient, select_hero};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Width/height band inside which a favicon or manifest icon counts as a square icon.
const SQUARE_ICON_ASPECT: std::ops::RangeInclusive<f64> = 0.9..=1.1;

/// An image URL found on the page, with the size its markup declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Everything the crawler extracted from one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageAssets {
    pub domain: String,
    pub site_name: Option<String>,
    pub favicon: Option<String>,
    pub logo: Option<String>,
    pub manifest_icons: Vec<String>,
    pub og_image: Option<String>,
    pub hero_candidates: Vec<DeclaredImage>,
    pub page_colors: Vec<PageColor>,
    pub link_button_colors: Vec<Rgb>,
    pub nav_header_color: Option<Rgb>,
}

impl PageAssets {
    /// Site name when known, else the domain without a leading `www.`.
    pub fn display_name(&self) -> &str {
        match self.site_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.domain.trim().trim_start_matches("www."),
        }
    }
}

/// The assets chosen for one page.
#[derive(Debug, Clone, Serialize)]
pub struct AssetReport {
    pub domain: String,
    pub brand: SelectionResult,
    /// Fallback monogram text, used by renderers when `brand.fallback` is set.
    pub initials: String,
    pub hero: HeroImageResult,
    /// Every hero candidate that was evaluated, in evaluation order.
    pub hero_evaluated: Vec<AnalysisResult>,
    /// Highest-scoring rejected hero candidate, kept for diagnostics.
    pub hero_best_rejected: Option<AnalysisResult>,
    pub color_scheme: ColorScheme,
    /// Where the proposed accent came from.
    pub accent_source: AccentSource,
    pub color_report: QualityGateReport,
}

pub struct AssetPipeline {
    config: EngineConfig,
    fetcher: Arc<dyn AssetFetcher>,
}

impl AssetPipeline {
    pub fn new(config: EngineConfig, fetcher: Arc<dyn AssetFetcher>) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[instrument(skip_all, fields(domain = %page.domain))]
    pub async fn run(&self, page: &PageAssets) -> AssetReport {
        let fetcher = self.fetcher.as_ref();
        let config = &self.config;

        // Stage 1: Candidate Selection
        let primary_hero = page
            .og_image
            .as_deref()
            .map(|url| Candidate::new(url, SourceTag::OpenGraph));
        let hero_candidates: Vec<Candidate> = page
            .hero_candidates
            .iter()
            .map(|image| {
                Candidate::new(image.url.as_str(), SourceTag::Scraped).with_declared_size(image.width, image.height)
            })
            .collect();
        let (brand, hero) = tokio::join!(
            select_brand_mark(
                page.favicon.as_deref(),
                page.logo.as_deref(),
                &page.manifest_icons,
                fetcher,
                config,
            ),
            select_hero(primary_hero, &hero_candidates, fetcher, config),
        );

        // Stage 2: Hero Preparation
        let HeroEvaluation {
            pick,
            evaluated: hero_evaluated,
            best_rejected: hero_best_rejected,
        } = hero;
        let hero = hero_or_gradient(pick, &page.domain, &config.hero);

        // Stage 3: Color Validation
        let mut context = color_context(page, &brand);
        let proposal = propose_scheme(&context, &config.color_gate);
        context.accent_source = proposal.accent_source;
        context.accent_confidence = proposal.accent_confidence;
        let (color_scheme, color_report) = validate_and_fix(proposal.scheme, &context, &config.color_gate);

        info!(
            brand_fallback = brand.fallback,
            hero_found = hero.is_found(),
            colors_passed = color_report.passed,
            scheme = %color_scheme,
            "page assets selected"
        );
        AssetReport {
            domain: page.domain.clone(),
            initials: initials(page.display_name()),
            brand,
            hero,
            hero_evaluated,
            hero_best_rejected,
            color_scheme,
            accent_source: context.accent_source,
            color_report,
        }
    }
}

/// Builds the gate's evidence from the page colors and the measured brand colors.
pub fn color_context(page: &PageAssets, brand: &SelectionResult) -> ColorContext {
    let measured = |source: SourceTag| brand.result_for(source).and_then(|r| r.dominant_color);

    ColorContext {
        favicon_color: measured(SourceTag::Favicon).or_else(|| measured(SourceTag::ManifestIcon)),
        logo_color: measured(SourceTag::Logo),
        square_icon_color: brand.winner.as_ref().filter(|w| is_square_icon(w)).and_then(|w| w.dominant_color),
        nav_header_color: page.nav_header_color,
        page_colors: page.page_colors.clone(),
        link_button_colors: page.link_button_colors.clone(),
        ..ColorContext::default()
    }
}

fn is_square_icon(result: &AnalysisResult) -> bool {
    let icon = matches!(result.candidate.source, SourceTag::Favicon | SourceTag::ManifestIcon);
    icon && result
        .dimensions
        .as_ref()
        .map(Dimensions::aspect_ratio)
        .is_some_and(|aspect| SQUARE_ICON_ASPECT.contains(&aspect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::analysis::Criterion;
    use std::collections::BTreeMap;

    fn measured(source: SourceTag, width: u32, height: u32, color: Rgb) -> AnalysisResult {
        AnalysisResult::scored(
            Candidate::new(format!("https://a.test/{source:?}.png"), source),
            Dimensions { width, height },
            &[(Criterion::Aspect, 1.0)],
            BTreeMap::from([(Criterion::Aspect, 80.0)]),
            1.0,
        )
        .with_dominant_color(Some(color))
    }

    fn selection(winner: AnalysisResult, others: Vec<AnalysisResult>) -> SelectionResult {
        let mut all_evaluated = vec![winner.clone()];
        all_evaluated.extend(others);
        SelectionResult {
            winner: Some(winner),
            all_evaluated,
            fallback: false,
            log: Vec::new(),
            mark: None,
        }
    }

    #[test]
    fn square_favicon_winner_feeds_the_square_icon_slot() {
        let blue = Rgb::new(37, 99, 235);
        let red = Rgb::new(220, 38, 38);
        let brand = selection(
            measured(SourceTag::Favicon, 64, 64, blue),
            vec![measured(SourceTag::Logo, 400, 100, red)],
        );
        let context = color_context(&PageAssets::default(), &brand);
        assert_eq!(context.square_icon_color, Some(blue));
        assert_eq!(context.favicon_color, Some(blue));
        assert_eq!(context.logo_color, Some(red));
    }

    #[test]
    fn wide_logo_winner_is_not_a_square_icon() {
        let red = Rgb::new(220, 38, 38);
        let brand = selection(measured(SourceTag::Logo, 400, 100, red), Vec::new());
        let context = color_context(&PageAssets::default(), &brand);
        assert_eq!(context.square_icon_color, None);
        assert_eq!(context.favicon_color, None);
    }

    #[test]
    fn manifest_icon_stands_in_for_a_missing_favicon() {
        let green = Rgb::new(22, 163, 74);
        let brand = selection(measured(SourceTag::ManifestIcon, 192, 192, green), Vec::new());
        let context = color_context(&PageAssets::default(), &brand);
        assert_eq!(context.favicon_color, Some(green));
    }

    #[test]
    fn display_name_falls_back_to_the_domain() {
        let mut page = PageAssets {
            domain: "www.northwind.test".to_string(),
            ..PageAssets::default()
        };
        assert_eq!(page.display_name(), "northwind.test");
        page.site_name = Some("Northwind Traders".to_string());
        assert_eq!(page.display_name(), "Northwind Traders");
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let mut config = EngineConfig::default();
        config.brand_mark.weights.aspect = 0.9;
        let fetcher: Arc<dyn AssetFetcher> = Arc::new(crate::assets::fetch::MemoryFetcher::new());
        assert!(AssetPipeline::new(config, fetcher).is_err());
    }

    #[test]
    fn page_assets_load_from_partial_json() {
        let page: PageAssets = serde_json::from_str(
            r##"{
                "domain": "acme.test",
                "favicon": "https://acme.test/favicon.png",
                "hero_candidates": [{ "url": "https://acme.test/a.jpg", "width": 1600 }],
                "page_colors": [{ "color": "#1E293B", "count": 12 }, { "color": "#ffffff" }],
                "link_button_colors": ["#2563eb"]
            }"##,
        )
        .unwrap();
        assert_eq!(page.hero_candidates[0].height, None);
        assert_eq!(page.page_colors[0].color, Rgb::new(0x1e, 0x29, 0x3b));
        assert_eq!(page.page_colors[1].count, 1);
        assert_eq!(page.link_button_colors, vec![Rgb::new(0x25, 0x63, 0xeb)]);
    }
}
