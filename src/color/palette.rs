// THEORY:
// Scheme construction. `propose_scheme` turns the brand evidence into a first draft
// that the gate then validates. Accent sources are tried from the most to the least
// trustworthy: the site's own nav header, the selected square icon, the favicon, the
// logo, link/button colors, the page palette, and finally the default palette. The
// sidebar is always a deep shade of the accent's hue family, and the sidebar text is
// whichever of white or near-black reads better on it.
//
// The neutral palette serves monochrome brands, and `gradient_for` picks a
// deterministic gradient from a SHA-256 of a stable seed string (the page domain).

use crate::color::rgb::Rgb;
use crate::color::scheme::{AccentSource, ColorContext, ColorScheme};
use crate::config::ColorGateConfig;
use serde::Serialize;
use sha2::{Digest, Sha256};

pub const DEFAULT_SIDEBAR: Rgb = Rgb::new(0x1e, 0x29, 0x3b);
pub const DEFAULT_TEXT: Rgb = Rgb::WHITE;
pub const DEFAULT_ACCENT: Rgb = Rgb::new(0x25, 0x63, 0xeb);
pub const DARK_TEXT: Rgb = Rgb::new(0x11, 0x11, 0x11);
pub const NEUTRAL_FALLBACK_SIDEBAR: Rgb = Rgb::new(0x1a, 0x1a, 0x1a);

/// HSL lightness of a sidebar derived from an accent.
pub const SIDEBAR_LIGHTNESS: f64 = 0.22;
/// Page colors lighter than this are never used as a neutral sidebar.
const NEUTRAL_SIDEBAR_MAX_LIGHTNESS: f64 = 0.3;
/// A nav header darker than this is used as the sidebar itself.
const DARK_NAV_LIGHTNESS: f64 = 0.35;

const GRADIENT_PRESETS: [(Rgb, Rgb); 8] = [
    (Rgb::new(0x0f, 0x17, 0x2a), Rgb::new(0x33, 0x41, 0x55)),
    (Rgb::new(0x1e, 0x3a, 0x8a), Rgb::new(0x3b, 0x82, 0xf6)),
    (Rgb::new(0x31, 0x2e, 0x81), Rgb::new(0x7c, 0x3a, 0xed)),
    (Rgb::new(0x06, 0x4e, 0x3b), Rgb::new(0x10, 0xb9, 0x81)),
    (Rgb::new(0x7c, 0x2d, 0x12), Rgb::new(0xf9, 0x73, 0x16)),
    (Rgb::new(0x83, 0x18, 0x43), Rgb::new(0xec, 0x48, 0x99)),
    (Rgb::new(0x13, 0x4e, 0x4a), Rgb::new(0x06, 0xb6, 0xd4)),
    (Rgb::new(0x3f, 0x3f, 0x46), Rgb::new(0xa1, 0xa1, 0xaa)),
];

/// The explicit "use the default palette" fallback.
pub fn default_palette() -> ColorScheme {
    ColorScheme::new(DEFAULT_SIDEBAR, DEFAULT_TEXT, DEFAULT_ACCENT)
}

/// White if it reaches `min_contrast`, else near-black if that does, else the better of
/// pure white and pure black.
pub fn readable_text(background: Rgb, min_contrast: f64) -> Rgb {
    if background.contrast_ratio(&Rgb::WHITE) >= min_contrast {
        return Rgb::WHITE;
    }
    if background.contrast_ratio(&DARK_TEXT) >= min_contrast {
        return DARK_TEXT;
    }
    if background.contrast_ratio(&Rgb::WHITE) >= background.contrast_ratio(&Rgb::BLACK) {
        Rgb::WHITE
    } else {
        Rgb::BLACK
    }
}

/// A deep shade in the accent's hue family.
pub fn sidebar_from_accent(accent: Rgb) -> Rgb {
    let saturation = (accent.saturation() * 0.8).clamp(0.25, 0.6);
    Rgb::from_hsl(accent.hue(), saturation, SIDEBAR_LIGHTNESS)
}

/// A proposed scheme and the provenance of its accent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    pub scheme: ColorScheme,
    pub accent_source: AccentSource,
    pub accent_confidence: f64,
}

pub fn propose_scheme(context: &ColorContext, config: &ColorGateConfig) -> Proposal {
    let usable = |color: &Rgb| color.saturation() >= config.min_accent_saturation;

    if let Some(nav) = context.nav_header_color.filter(usable) {
        let (sidebar, accent) = if nav.lightness() < DARK_NAV_LIGHTNESS {
            (nav, nav.with_lightness(0.5))
        } else {
            (sidebar_from_accent(nav), nav)
        };
        return proposal(sidebar, accent, AccentSource::NavHeader, 0.9, config);
    }

    let ranked = [
        (context.square_icon_color, AccentSource::SquareIcon, 0.85),
        (context.favicon_color, AccentSource::Favicon, 0.8),
        (context.logo_color, AccentSource::Logo, 0.75),
    ];
    for (color, source, confidence) in ranked {
        if let Some(accent) = color.filter(usable) {
            return proposal(sidebar_from_accent(accent), accent, source, confidence, config);
        }
    }

    let link = context
        .link_button_colors
        .iter()
        .copied()
        .filter(usable)
        .fold(None, |best: Option<Rgb>, c| match best {
            Some(b) if b.saturation() >= c.saturation() => Some(b),
            _ => Some(c),
        });
    if let Some(accent) = link {
        return proposal(sidebar_from_accent(accent), accent, AccentSource::LinkButton, 0.6, config);
    }

    let page = context
        .page_colors
        .iter()
        .filter(|p| usable(&p.color))
        .fold(None, |best: Option<(Rgb, u32)>, p| match best {
            Some((_, count)) if count >= p.count => best,
            _ => Some((p.color, p.count)),
        });
    if let Some((accent, _)) = page {
        return proposal(sidebar_from_accent(accent), accent, AccentSource::Page, 0.4, config);
    }

    Proposal {
        scheme: default_palette(),
        accent_source: AccentSource::Default,
        accent_confidence: 0.0,
    }
}

fn proposal(
    sidebar: Rgb,
    accent: Rgb,
    accent_source: AccentSource,
    accent_confidence: f64,
    config: &ColorGateConfig,
) -> Proposal {
    Proposal {
        scheme: ColorScheme::new(sidebar, readable_text(sidebar, config.min_text_contrast), accent),
        accent_source,
        accent_confidence,
    }
}

/// Gray palette for monochrome brands.
///
/// The sidebar is the darkest low-saturation page color, desaturated to a true gray
/// (falling back to `#1a1a1a`); the accent is a lighter gray of the same family.
pub fn neutral_palette(context: &ColorContext, config: &ColorGateConfig) -> ColorScheme {
    let sidebar = context
        .page_colors
        .iter()
        .map(|p| p.color)
        .filter(|c| c.saturation() < config.monochrome_page_saturation)
        .filter(|c| c.lightness() < NEUTRAL_SIDEBAR_MAX_LIGHTNESS)
        .fold(None, |darkest: Option<Rgb>, c| match darkest {
            Some(d) if d.lightness() <= c.lightness() => Some(d),
            _ => Some(c),
        })
        .map(|c| c.desaturated())
        .unwrap_or(NEUTRAL_FALLBACK_SIDEBAR);
    let accent = Rgb::from_hsl(0.0, 0.0, (sidebar.lightness() + 0.3).clamp(0.35, 0.45));
    ColorScheme::new(sidebar, readable_text(sidebar, config.min_text_contrast), accent)
}

/// A two-stop linear gradient used when no hero image qualifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gradient {
    pub angle: u16,
    pub from: Rgb,
    pub to: Rgb,
    pub css: String,
}

/// Picks a preset and angle from the SHA-256 of the normalized seed.
pub fn gradient_for(seed: &str) -> Gradient {
    let digest = Sha256::digest(seed.trim().to_lowercase().as_bytes());
    let (from, to) = GRADIENT_PRESETS[digest[0] as usize % GRADIENT_PRESETS.len()];
    let angle = u16::from_be_bytes([digest[1], digest[2]]) % 360;
    Gradient {
        angle,
        from,
        to,
        css: format!("linear-gradient({angle}deg, {from} 0%, {to} 100%)"),
    }
}
