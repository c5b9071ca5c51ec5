// THEORY:
// One repair pass is a pure function `(scheme, failing checks) -> scheme`. Repairs run
// in a fixed priority order: contrast first, then sidebar strength and brand
// preservation, then the softer harmony, distinctness, anti-template and button
// usability fixes. Each repair touches only the color its check implicates; any repair
// that replaces the sidebar also re-picks the sidebar text so contrast is not lost.
//
// A pass does not re-evaluate anything. The gate re-runs every check from scratch
// after each pass.

use crate::color::palette::{DEFAULT_ACCENT, SIDEBAR_LIGHTNESS, readable_text};
use crate::color::rgb::Rgb;
use crate::color::scheme::{CheckName, ColorContext, ColorScheme};
use crate::config::ColorGateConfig;

/// Order in which failing checks are repaired.
pub const REPAIR_ORDER: [CheckName; 10] = [
    CheckName::SidebarTextContrast,
    CheckName::SidebarNotWashedOut,
    CheckName::BrandPreserved,
    CheckName::SaturatedBrandNotIgnored,
    CheckName::AccentSaturated,
    CheckName::NotBothNeutral,
    CheckName::HueHarmony,
    CheckName::AccentDistinct,
    CheckName::NotGenericTemplate,
    CheckName::AccentUsableOnWhite,
];

const LIGHTNESS_STEP: f64 = 0.05;
const MAX_LIGHTNESS_STEPS: usize = 20;

type Repair = fn(ColorScheme, &ColorContext, &ColorGateConfig) -> Option<(ColorScheme, String)>;

/// Applies the repair of every failing check, in priority order.
///
/// Returns the new scheme and one line per change made.
pub fn repair(
    scheme: ColorScheme,
    failing: &[CheckName],
    context: &ColorContext,
    config: &ColorGateConfig,
) -> (ColorScheme, Vec<String>) {
    let mut scheme = scheme;
    let mut adjustments = Vec::new();
    for name in REPAIR_ORDER {
        if !failing.contains(&name) {
            continue;
        }
        if let Some((next, note)) = repair_for(name)(scheme, context, config) {
            if next != scheme {
                adjustments.push(note);
                scheme = next;
            }
        }
    }
    (scheme, adjustments)
}

fn repair_for(name: CheckName) -> Repair {
    match name {
        CheckName::SidebarTextContrast => fix_contrast,
        CheckName::SidebarNotWashedOut => strengthen_sidebar,
        CheckName::BrandPreserved | CheckName::SaturatedBrandNotIgnored => restore_brand_accent,
        CheckName::AccentSaturated | CheckName::NotBothNeutral => saturate_accent,
        CheckName::HueHarmony => harmonize_sidebar,
        CheckName::AccentDistinct => separate_accent,
        CheckName::NotGenericTemplate => brand_the_template,
        CheckName::AccentUsableOnWhite => darken_accent_for_white,
    }
}

fn with_sidebar(scheme: ColorScheme, sidebar: Rgb, config: &ColorGateConfig) -> ColorScheme {
    ColorScheme::new(sidebar, readable_text(sidebar, config.min_text_contrast), scheme.accent)
}

/// Hue to steer toward: the brand's strongest color, else a colored sidebar, else the default accent.
fn target_hue(scheme: &ColorScheme, context: &ColorContext, config: &ColorGateConfig) -> f64 {
    context
        .saturated_alternative(config.min_accent_saturation)
        .or_else(|| {
            Some(scheme.sidebar_background).filter(|c| !c.is_neutral(config.neutral_saturation))
        })
        .unwrap_or(DEFAULT_ACCENT)
        .hue()
}

fn fix_contrast(
    scheme: ColorScheme,
    _context: &ColorContext,
    config: &ColorGateConfig,
) -> Option<(ColorScheme, String)> {
    let mut sidebar = scheme.sidebar_background;
    let mut text = readable_text(sidebar, config.min_text_contrast);
    let mut steps = 0;
    while sidebar.contrast_ratio(&text) < config.min_text_contrast && steps < MAX_LIGHTNESS_STEPS {
        sidebar = sidebar.with_lightness(sidebar.lightness() - LIGHTNESS_STEP);
        text = readable_text(sidebar, config.min_text_contrast);
        steps += 1;
    }
    let note = format!(
        "sidebar text {} -> {} on {}",
        scheme.sidebar_text, text, sidebar
    );
    Some((ColorScheme::new(sidebar, text, scheme.accent), note))
}

fn strengthen_sidebar(
    scheme: ColorScheme,
    context: &ColorContext,
    config: &ColorGateConfig,
) -> Option<(ColorScheme, String)> {
    let source = context.saturated_alternative(config.min_accent_saturation)?;
    let saturation = (source.saturation() * 0.8).clamp(0.35, 0.7);
    let sidebar = Rgb::from_hsl(source.hue(), saturation, SIDEBAR_LIGHTNESS);
    let note = format!(
        "sidebar {} -> {} from {}",
        scheme.sidebar_background, sidebar, source
    );
    Some((with_sidebar(scheme, sidebar, config), note))
}

fn restore_brand_accent(
    scheme: ColorScheme,
    context: &ColorContext,
    config: &ColorGateConfig,
) -> Option<(ColorScheme, String)> {
    let brand = context.strongest_brand_color(config.strong_brand_saturation)?;
    let accent = if brand.saturation() < config.min_accent_saturation {
        brand.with_saturation(config.min_accent_saturation)
    } else {
        brand
    };
    let note = format!("accent {} -> brand color {}", scheme.accent, accent);
    Some((ColorScheme { accent, ..scheme }, note))
}

fn saturate_accent(
    scheme: ColorScheme,
    context: &ColorContext,
    config: &ColorGateConfig,
) -> Option<(ColorScheme, String)> {
    let current = scheme.accent;
    let target = (config.min_accent_saturation + 0.15).min(1.0);
    let accent = if current.saturation() >= config.true_neutral_saturation {
        current.with_saturation(current.saturation().max(target))
    } else {
        // A gray has no hue of its own; borrow one.
        Rgb::from_hsl(
            target_hue(&scheme, context, config),
            target.max(0.6),
            current.lightness().clamp(0.35, 0.55),
        )
    };
    let note = format!("accent {current} -> {accent} (saturation)");
    Some((ColorScheme { accent, ..scheme }, note))
}

fn harmonize_sidebar(
    scheme: ColorScheme,
    _context: &ColorContext,
    config: &ColorGateConfig,
) -> Option<(ColorScheme, String)> {
    let sidebar = scheme.sidebar_background;
    let shifted = Rgb::from_hsl(scheme.accent.hue(), sidebar.saturation(), sidebar.lightness());
    let note = format!("sidebar {sidebar} -> {shifted} (accent hue family)");
    Some((with_sidebar(scheme, shifted, config), note))
}

fn separate_accent(
    scheme: ColorScheme,
    _context: &ColorContext,
    config: &ColorGateConfig,
) -> Option<(ColorScheme, String)> {
    let sidebar = scheme.sidebar_background;
    if sidebar.lightness() >= 0.35 {
        let darker = sidebar.with_lightness(SIDEBAR_LIGHTNESS - 0.02);
        let note = format!("sidebar {sidebar} -> {darker} (separate from accent)");
        return Some((with_sidebar(scheme, darker, config), note));
    }
    let accent = scheme.accent;
    let lightness = (accent.lightness() + 0.1).max(sidebar.lightness() + 0.3).min(0.65);
    let lifted = accent.with_lightness(lightness);
    let note = format!("accent {accent} -> {lifted} (separate from sidebar)");
    Some((ColorScheme { accent: lifted, ..scheme }, note))
}

fn brand_the_template(
    scheme: ColorScheme,
    context: &ColorContext,
    config: &ColorGateConfig,
) -> Option<(ColorScheme, String)> {
    let hue = target_hue(&scheme, context, config);
    let mut next = scheme;
    if next.sidebar_background.saturation() < config.template_sidebar_saturation {
        let lightness = next.sidebar_background.lightness().min(SIDEBAR_LIGHTNESS);
        next = with_sidebar(
            next,
            Rgb::from_hsl(hue, config.template_sidebar_saturation + 0.15, lightness),
            config,
        );
    }
    if next.accent.saturation() < config.template_accent_saturation {
        next.accent = Rgb::from_hsl(hue, (config.template_accent_saturation + 0.4).min(1.0), 0.45);
    }
    let note = format!("tinted generic scheme toward hue {hue:.0}°: {next}");
    Some((next, note))
}

fn darken_accent_for_white(
    scheme: ColorScheme,
    _context: &ColorContext,
    config: &ColorGateConfig,
) -> Option<(ColorScheme, String)> {
    let mut accent = scheme.accent;
    let mut steps = 0;
    while accent.contrast_ratio(&Rgb::WHITE) < config.button_min_contrast && steps < MAX_LIGHTNESS_STEPS {
        accent = accent.with_lightness(accent.lightness() - LIGHTNESS_STEP);
        steps += 1;
    }
    let note = format!("accent {} -> {} (button on white)", scheme.accent, accent);
    Some((ColorScheme { accent, ..scheme }, note))
}
