// THEORY:
// The ten rules a color scheme must satisfy. Each check is an independent pure function
// of (scheme, context, config) returning pass/fail and a human-readable detail. No
// check looks at another check's outcome, so `evaluate` can run them in any order and
// always rebuilds the full picture from scratch.

use crate::color::rgb::Rgb;
use crate::color::scheme::{CheckName, CheckOutcome, CheckResults, ColorContext, ColorScheme};
use crate::config::ColorGateConfig;

/// Lightness band in which a low-saturation sidebar reads as dull gray.
const WASHED_OUT_LIGHTNESS: (f64, f64) = (0.25, 0.85);

pub fn evaluate(scheme: &ColorScheme, context: &ColorContext, config: &ColorGateConfig) -> CheckResults {
    CheckName::ALL
        .iter()
        .map(|name| (*name, run_check(*name, scheme, context, config)))
        .collect()
}

pub fn run_check(
    name: CheckName,
    scheme: &ColorScheme,
    context: &ColorContext,
    config: &ColorGateConfig,
) -> CheckOutcome {
    match name {
        CheckName::SidebarNotWashedOut => sidebar_not_washed_out(scheme, context, config),
        CheckName::AccentSaturated => accent_saturated(scheme, config),
        CheckName::BrandPreserved => brand_preserved(scheme, context, config),
        CheckName::SidebarTextContrast => sidebar_text_contrast(scheme, config),
        CheckName::NotBothNeutral => not_both_neutral(scheme, config),
        CheckName::HueHarmony => hue_harmony(scheme, context, config),
        CheckName::AccentDistinct => accent_distinct(scheme, config),
        CheckName::NotGenericTemplate => not_generic_template(scheme, context, config),
        CheckName::SaturatedBrandNotIgnored => saturated_brand_not_ignored(scheme, context, config),
        CheckName::AccentUsableOnWhite => accent_usable_on_white(scheme, context, config),
    }
}

fn sidebar_not_washed_out(scheme: &ColorScheme, context: &ColorContext, config: &ColorGateConfig) -> CheckOutcome {
    let sidebar = scheme.sidebar_background;
    let saturation = sidebar.saturation();
    let lightness = sidebar.lightness();
    let washed_out = saturation < config.washed_out_saturation
        && (WASHED_OUT_LIGHTNESS.0..=WASHED_OUT_LIGHTNESS.1).contains(&lightness);
    if !washed_out {
        return CheckOutcome::pass(format!("sidebar {sidebar} saturation {saturation:.2}, lightness {lightness:.2}"));
    }
    match context.saturated_alternative(config.min_accent_saturation) {
        Some(alternative) => CheckOutcome::fail(format!(
            "sidebar {sidebar} is washed-out gray while {alternative} is available"
        )),
        None => CheckOutcome::pass(format!("sidebar {sidebar} is gray but no saturated alternative exists")),
    }
}

fn accent_saturated(scheme: &ColorScheme, config: &ColorGateConfig) -> CheckOutcome {
    let saturation = scheme.accent.saturation();
    if saturation >= config.min_accent_saturation {
        CheckOutcome::pass(format!("accent saturation {saturation:.2}"))
    } else {
        CheckOutcome::fail(format!(
            "accent {} saturation {saturation:.2} below {:.2}",
            scheme.accent, config.min_accent_saturation
        ))
    }
}

fn brand_preserved(scheme: &ColorScheme, context: &ColorContext, config: &ColorGateConfig) -> CheckOutcome {
    let Some(brand) = context.strongest_brand_color(config.strong_brand_saturation) else {
        return CheckOutcome::pass("no strong brand color to preserve");
    };
    if context.accent_source.is_brand() {
        return CheckOutcome::pass(format!("accent sourced from {:?}", context.accent_source));
    }
    let sidebar_gap = brand.hue_distance(&scheme.sidebar_background);
    let accent_gap = brand.hue_distance(&scheme.accent);
    let sidebar_carries = sidebar_gap <= config.brand_hue_tolerance
        && !scheme.sidebar_background.is_neutral(config.neutral_saturation);
    let accent_carries = accent_gap <= config.brand_hue_tolerance
        && !scheme.accent.is_neutral(config.neutral_saturation);
    if sidebar_carries || accent_carries {
        CheckOutcome::pass(format!("brand color {brand} reflected in the scheme"))
    } else {
        CheckOutcome::fail(format!(
            "brand color {brand} missing (sidebar {sidebar_gap:.0}°, accent {accent_gap:.0}° away)"
        ))
    }
}

fn sidebar_text_contrast(scheme: &ColorScheme, config: &ColorGateConfig) -> CheckOutcome {
    let ratio = scheme.sidebar_background.contrast_ratio(&scheme.sidebar_text);
    if ratio >= config.min_text_contrast {
        CheckOutcome::pass(format!("contrast {ratio:.2}:1"))
    } else {
        CheckOutcome::fail(format!(
            "contrast {ratio:.2}:1 below {:.1}:1",
            config.min_text_contrast
        ))
    }
}

fn not_both_neutral(scheme: &ColorScheme, config: &ColorGateConfig) -> CheckOutcome {
    let sidebar_neutral = scheme.sidebar_background.is_neutral(config.neutral_saturation);
    let accent_neutral = scheme.accent.is_neutral(config.neutral_saturation);
    if sidebar_neutral && accent_neutral {
        CheckOutcome::fail("sidebar and accent are both neutral")
    } else {
        CheckOutcome::pass("at least one of sidebar and accent carries color")
    }
}

fn hue_harmony(scheme: &ColorScheme, context: &ColorContext, config: &ColorGateConfig) -> CheckOutcome {
    if context.accent_source.is_brand() {
        return CheckOutcome::pass("exempt: accent is brand-sourced");
    }
    let sidebar = scheme.sidebar_background;
    let accent = scheme.accent;
    if sidebar.saturation() < config.harmony_exempt_saturation
        || accent.saturation() < config.harmony_exempt_saturation
    {
        return CheckOutcome::pass("exempt: low-saturation color");
    }
    let gap = sidebar.hue_distance(&accent);
    if gap <= config.hue_tolerance {
        CheckOutcome::pass(format!("hues {gap:.0}° apart"))
    } else {
        CheckOutcome::fail(format!(
            "hues {gap:.0}° apart, tolerance {:.0}°",
            config.hue_tolerance
        ))
    }
}

fn accent_distinct(scheme: &ColorScheme, config: &ColorGateConfig) -> CheckOutcome {
    let sidebar = scheme.sidebar_background;
    let accent = scheme.accent;
    let luminance_gap = (accent.relative_luminance() - sidebar.relative_luminance()).abs();
    if luminance_gap >= config.distinct_luminance_gap {
        return CheckOutcome::pass(format!("luminance gap {luminance_gap:.3}"));
    }
    let both_colored =
        !sidebar.is_neutral(config.neutral_saturation) && !accent.is_neutral(config.neutral_saturation);
    let hue_gap = sidebar.hue_distance(&accent);
    if both_colored && hue_gap >= config.distinct_hue_gap {
        return CheckOutcome::pass(format!("hue gap {hue_gap:.0}°"));
    }
    CheckOutcome::fail(format!(
        "accent {accent} blends into sidebar {sidebar} (luminance gap {luminance_gap:.3})"
    ))
}

fn not_generic_template(scheme: &ColorScheme, context: &ColorContext, config: &ColorGateConfig) -> CheckOutcome {
    let share = context.neutral_share(config.neutral_saturation);
    let generic = share >= config.template_neutral_share
        && scheme.sidebar_background.saturation() < config.template_sidebar_saturation
        && scheme.accent.saturation() < config.template_accent_saturation;
    if generic {
        CheckOutcome::fail(format!(
            "{:.0}% neutral page colors with a muted sidebar and accent",
            share * 100.0
        ))
    } else {
        CheckOutcome::pass(format!("{:.0}% neutral page colors", share * 100.0))
    }
}

fn saturated_brand_not_ignored(
    scheme: &ColorScheme,
    context: &ColorContext,
    config: &ColorGateConfig,
) -> CheckOutcome {
    let vivid: Vec<Rgb> = context
        .brand_colors()
        .filter(|c| c.saturation() >= config.saturated_brand_saturation)
        .collect();
    if vivid.is_empty() {
        return CheckOutcome::pass("no strongly saturated brand color");
    }
    let reflected = |color: &Rgb| {
        !color.is_neutral(config.neutral_saturation)
            && vivid
                .iter()
                .any(|brand| brand.hue_distance(color) <= config.saturated_brand_hue_tolerance)
    };
    if reflected(&scheme.accent) || reflected(&scheme.sidebar_background) {
        CheckOutcome::pass("saturated brand color reflected")
    } else {
        let list: Vec<String> = vivid.iter().map(Rgb::hex).collect();
        CheckOutcome::fail(format!("saturated brand color {} ignored", list.join(", ")))
    }
}

fn accent_usable_on_white(scheme: &ColorScheme, context: &ColorContext, config: &ColorGateConfig) -> CheckOutcome {
    if context.accent_confidence < config.high_confidence_accent {
        return CheckOutcome::pass(format!(
            "exempt: accent confidence {:.2}",
            context.accent_confidence
        ));
    }
    let ratio = scheme.accent.contrast_ratio(&Rgb::WHITE);
    if ratio >= config.button_min_contrast {
        CheckOutcome::pass(format!("accent on white {ratio:.2}:1"))
    } else {
        CheckOutcome::fail(format!(
            "accent on white {ratio:.2}:1 below {:.1}:1",
            config.button_min_contrast
        ))
    }
}
