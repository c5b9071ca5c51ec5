// THEORY:
// The color gate. A monochrome brand short-circuits to the neutral palette with every
// check passing by definition. Otherwise the gate runs a bounded fix loop:
//
//   evaluate all ten checks -> all pass? stop : repair the failing ones -> repeat
//
// at most `max_iterations` (never more than three) times. The report always reflects a
// fresh evaluation of the scheme that is returned, so `passed == false` names exactly
// the checks the returned colors still fail. The gate never errors.

use crate::color::checks::evaluate;
use crate::color::palette::neutral_palette;
use crate::color::repair::repair;
use crate::color::scheme::{CheckName, CheckOutcome, ColorContext, ColorScheme, QualityGateReport};
use crate::config::{ColorGateConfig, MAX_ITERATIONS};
use tracing::{debug, info, instrument};

/// Known brand colors exist and none of them is saturated, nor is any nav or link/button
/// color, nor a page color used for at least `monochrome_page_min_share` of the page.
pub fn is_monochrome_brand(context: &ColorContext, config: &ColorGateConfig) -> bool {
    let mut brand = context.brand_colors().peekable();
    if brand.peek().is_none() {
        return false;
    }
    let brand_neutral = brand.all(|c| c.saturation() < config.monochrome_brand_saturation);
    let chrome_neutral = context
        .link_button_colors
        .iter()
        .chain(context.nav_header_color.iter())
        .all(|c| c.saturation() < config.monochrome_page_saturation);
    brand_neutral && chrome_neutral && saturated_page_share(context, config) < config.monochrome_page_min_share
}

/// Usage share (0..1) of page colors at or above the monochrome page saturation.
fn saturated_page_share(context: &ColorContext, config: &ColorGateConfig) -> f64 {
    let total: u64 = context.page_colors.iter().map(|p| p.count as u64).sum();
    if total == 0 {
        return 0.0;
    }
    let saturated: u64 = context
        .page_colors
        .iter()
        .filter(|p| p.color.saturation() >= config.monochrome_page_saturation)
        .map(|p| p.count as u64)
        .sum();
    saturated as f64 / total as f64
}

#[instrument(skip_all, fields(proposed = %proposed))]
pub fn validate_and_fix(
    proposed: ColorScheme,
    context: &ColorContext,
    config: &ColorGateConfig,
) -> (ColorScheme, QualityGateReport) {
    if is_monochrome_brand(context, config) {
        let neutral = neutral_palette(context, config);
        info!(scheme = %neutral, "monochrome brand, using neutral palette");
        let checks = CheckName::ALL
            .iter()
            .map(|name| (*name, CheckOutcome::pass("monochrome brand")))
            .collect();
        let report = QualityGateReport {
            passed: true,
            checks,
            adjustments: vec![format!("neutral palette for monochrome brand: {neutral}")],
            iterations: 0,
            original_colors: proposed,
            final_colors: neutral,
            monochrome: true,
        };
        return (neutral, report);
    }

    let budget = config.max_iterations.min(MAX_ITERATIONS);
    let mut scheme = proposed;
    let mut adjustments = Vec::new();
    let mut iterations = 0;
    let mut checks = evaluate(&scheme, context, config);

    while iterations < budget {
        let failing: Vec<CheckName> = checks
            .iter()
            .filter(|(_, outcome)| !outcome.passed)
            .map(|(name, _)| *name)
            .collect();
        if failing.is_empty() {
            break;
        }
        debug!(iteration = iterations + 1, ?failing, "repairing color scheme");
        let (next, notes) = repair(scheme, &failing, context, config);
        adjustments.extend(notes);
        scheme = next;
        iterations += 1;
        checks = evaluate(&scheme, context, config);
    }

    let passed = checks.values().all(|outcome| outcome.passed);
    info!(passed, iterations, scheme = %scheme, "color gate finished");
    let report = QualityGateReport {
        passed,
        checks,
        adjustments,
        iterations,
        original_colors: proposed,
        final_colors: scheme,
        monochrome: false,
    };
    (scheme, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::palette::{default_palette, propose_scheme};
    use crate::color::rgb::Rgb;
    use crate::color::scheme::{AccentSource, PageColor};

    fn hex(s: &str) -> Rgb {
        Rgb::parse(s).unwrap()
    }

    fn is_well_formed(color: &Rgb) -> bool {
        let hex = color.hex();
        hex.len() == 7 && hex.starts_with('#') && hex[1..].chars().all(|c| c.is_ascii_hexdigit())
    }

    #[test]
    fn passing_scheme_is_left_alone() {
        let scheme = default_palette();
        let (fixed, report) = validate_and_fix(scheme, &ColorContext::default(), &ColorGateConfig::default());
        assert_eq!(fixed, scheme);
        assert_eq!(report.iterations, 0);
        assert!(report.passed);
        assert_eq!(report.final_colors, report.original_colors);
        assert!(report.adjustments.is_empty());
    }

    #[test]
    fn hopeless_schemes_still_terminate() {
        let context = ColorContext {
            favicon_color: Some(hex("#e11d48")),
            logo_color: Some(hex("#16a34a")),
            page_colors: vec![PageColor::new(hex("#f5f5f5"), 50)],
            accent_confidence: 0.95,
            ..Default::default()
        };
        let scheme = ColorScheme::new(hex("#808080"), hex("#888888"), hex("#8a8a8a"));
        let (fixed, report) = validate_and_fix(scheme, &context, &ColorGateConfig::default());
        assert!(report.iterations <= 3);
        assert_eq!(report.checks.len(), 10);
        assert_eq!(report.passed, report.checks.values().all(|o| o.passed));
        assert!(is_well_formed(&fixed.sidebar_background));
        assert!(is_well_formed(&fixed.sidebar_text));
        assert!(is_well_formed(&fixed.accent));
        assert_eq!(report.final_colors, fixed);
    }

    #[test]
    fn washed_out_sidebar_is_repaired() {
        let context = ColorContext {
            favicon_color: Some(hex("#7c3aed")),
            ..Default::default()
        };
        let scheme = ColorScheme::new(hex("#9ca3af"), hex("#000000"), hex("#7c3aed"));
        let (fixed, report) = validate_and_fix(scheme, &context, &ColorGateConfig::default());
        assert!(report.passed, "{report:#?}");
        assert!(report.iterations >= 1);
        assert!(fixed.sidebar_background.saturation() >= 0.12);
        assert!(fixed.sidebar_background.contrast_ratio(&fixed.sidebar_text) >= 4.5);
    }

    #[test]
    fn monochrome_brand_gets_a_true_neutral_sidebar() {
        let config = ColorGateConfig::default();
        let context = ColorContext {
            // saturation 0.03 and 0.02
            favicon_color: Some(Rgb::from_hsl(210.0, 0.03, 0.3)),
            logo_color: Some(Rgb::from_hsl(30.0, 0.02, 0.2)),
            link_button_colors: vec![Rgb::from_hsl(200.0, 0.10, 0.4)],
            page_colors: vec![PageColor::new(hex("#1c1d21"), 4), PageColor::new(hex("#ffffff"), 30)],
            ..Default::default()
        };
        assert!(is_monochrome_brand(&context, &config));
        let proposal = propose_scheme(&context, &config);
        let (fixed, report) = validate_and_fix(proposal.scheme, &context, &config);
        assert!(report.monochrome);
        assert!(report.passed);
        assert_eq!(report.iterations, 0);
        assert!(report.checks.values().all(|o| o.passed));
        assert!(fixed.sidebar_background.saturation() <= 0.05);
        assert_eq!(fixed.sidebar_background.r, fixed.sidebar_background.g);
        assert_eq!(fixed.sidebar_background.g, fixed.sidebar_background.b);
        assert!(fixed.accent.saturation() <= 0.05);
    }

    #[test]
    fn saturated_link_color_defeats_monochrome() {
        let config = ColorGateConfig::default();
        let context = ColorContext {
            favicon_color: Some(hex("#333333")),
            link_button_colors: vec![hex("#2563eb")],
            ..Default::default()
        };
        assert!(!is_monochrome_brand(&context, &config));
        assert!(!is_monochrome_brand(&ColorContext::default(), &config));
    }

    #[test]
    fn saturated_page_palette_defeats_monochrome() {
        let config = ColorGateConfig::default();
        let mut context = ColorContext {
            favicon_color: Some(hex("#3c3c3c")),
            page_colors: vec![PageColor::new(hex("#e11d48"), 40), PageColor::new(hex("#ffffff"), 60)],
            ..Default::default()
        };
        assert!(!is_monochrome_brand(&context, &config));

        let proposal = propose_scheme(&context, &config);
        assert_eq!(proposal.accent_source, AccentSource::Page);
        let (fixed, report) = validate_and_fix(proposal.scheme, &context, &config);
        assert!(!report.monochrome);
        assert!(fixed.accent.hue_distance(&hex("#e11d48")) < 1.0, "{fixed}");

        // A stray saturated swatch below the usage share does not count.
        context.page_colors = vec![PageColor::new(hex("#e11d48"), 1), PageColor::new(hex("#ffffff"), 99)];
        assert!(is_monochrome_brand(&context, &config));
    }

    #[test]
    fn favicon_sourced_accent_preserves_brand() {
        let config = ColorGateConfig::default();
        let favicon = Rgb::from_hsl(200.0, 0.35, 0.45);
        let mut context = ColorContext {
            square_icon_color: Some(favicon),
            favicon_color: Some(favicon),
            ..Default::default()
        };
        let proposal = propose_scheme(&context, &config);
        assert_eq!(proposal.accent_source, AccentSource::SquareIcon);
        context.accent_source = proposal.accent_source;
        context.accent_confidence = proposal.accent_confidence;

        let (fixed, report) = validate_and_fix(proposal.scheme, &context, &config);
        assert!(report.checks[&CheckName::BrandPreserved].passed);
        assert!(fixed.sidebar_background.contrast_ratio(&fixed.sidebar_text) >= 4.5);
        assert!(fixed.sidebar_background.hue_distance(&fixed.accent) <= 15.0);
    }
}
