// THEORY:
// The values the color gate reasons about. A `ColorScheme` is the output (three colors),
// a `ColorContext` is everything known about the brand when the scheme was proposed:
// the colors sampled from the brand marks, the page's own palette, and which source
// the accent was taken from. The context never changes during a gate run; only the
// scheme is threaded through the repair loop.

use crate::color::rgb::Rgb;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sidebar background, sidebar text and accent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub sidebar_background: Rgb,
    pub sidebar_text: Rgb,
    pub accent: Rgb,
}

impl ColorScheme {
    pub fn new(sidebar_background: Rgb, sidebar_text: Rgb, accent: Rgb) -> Self {
        Self {
            sidebar_background,
            sidebar_text,
            accent,
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sidebar {} / text {} / accent {}",
            self.sidebar_background, self.sidebar_text, self.accent
        )
    }
}

/// Where the proposed accent color came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccentSource {
    NavHeader,
    SquareIcon,
    Favicon,
    Logo,
    LinkButton,
    Page,
    #[default]
    Default,
}

impl AccentSource {
    /// Sources that are the brand's own artwork or chrome.
    pub fn is_brand(&self) -> bool {
        matches!(
            self,
            AccentSource::NavHeader | AccentSource::SquareIcon | AccentSource::Favicon | AccentSource::Logo
        )
    }
}

/// A color extracted from the page with its usage count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageColor {
    pub color: Rgb,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

impl PageColor {
    pub fn new(color: Rgb, count: u32) -> Self {
        Self { color, count }
    }
}

/// Brand evidence the gate checks a scheme against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorContext {
    pub favicon_color: Option<Rgb>,
    pub logo_color: Option<Rgb>,
    /// Dominant color of the selected brand mark when it is a square icon.
    pub square_icon_color: Option<Rgb>,
    pub nav_header_color: Option<Rgb>,
    pub page_colors: Vec<PageColor>,
    pub link_button_colors: Vec<Rgb>,
    pub accent_source: AccentSource,
    /// 0..1 certainty that the accent is really the brand color.
    pub accent_confidence: f64,
}

impl ColorContext {
    /// Favicon and logo colors that are known.
    pub fn brand_colors(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.favicon_color.into_iter().chain(self.logo_color)
    }

    /// The most saturated brand color at or above `min_saturation`.
    pub fn strongest_brand_color(&self, min_saturation: f64) -> Option<Rgb> {
        most_saturated(self.brand_colors(), min_saturation)
    }

    /// The most saturated color anywhere in the context at or above `min_saturation`.
    ///
    /// Brand marks are searched first, then the nav header, link/button colors and
    /// the page palette.
    pub fn saturated_alternative(&self, min_saturation: f64) -> Option<Rgb> {
        self.strongest_brand_color(min_saturation)
            .or_else(|| self.square_icon_color.filter(|c| c.saturation() >= min_saturation))
            .or_else(|| self.nav_header_color.filter(|c| c.saturation() >= min_saturation))
            .or_else(|| most_saturated(self.link_button_colors.iter().copied(), min_saturation))
            .or_else(|| most_saturated(self.page_colors.iter().map(|p| p.color), min_saturation))
    }

    /// Share (0..1) of page color usage that is neutral; 0 when the page has no colors.
    pub fn neutral_share(&self, neutral_saturation: f64) -> f64 {
        let total: u64 = self.page_colors.iter().map(|p| p.count as u64).sum();
        if total == 0 {
            return 0.0;
        }
        let neutral: u64 = self
            .page_colors
            .iter()
            .filter(|p| p.color.is_neutral(neutral_saturation))
            .map(|p| p.count as u64)
            .sum();
        neutral as f64 / total as f64
    }
}

fn most_saturated(colors: impl Iterator<Item = Rgb>, min_saturation: f64) -> Option<Rgb> {
    colors
        .filter(|c| c.saturation() >= min_saturation)
        .fold(None, |best: Option<Rgb>, c| match best {
            Some(b) if b.saturation() >= c.saturation() => Some(b),
            _ => Some(c),
        })
}

/// The ten rules of the color gate, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    SidebarNotWashedOut,
    AccentSaturated,
    BrandPreserved,
    SidebarTextContrast,
    NotBothNeutral,
    HueHarmony,
    AccentDistinct,
    NotGenericTemplate,
    SaturatedBrandNotIgnored,
    AccentUsableOnWhite,
}

impl CheckName {
    pub const ALL: [CheckName; 10] = [
        CheckName::SidebarNotWashedOut,
        CheckName::AccentSaturated,
        CheckName::BrandPreserved,
        CheckName::SidebarTextContrast,
        CheckName::NotBothNeutral,
        CheckName::HueHarmony,
        CheckName::AccentDistinct,
        CheckName::NotGenericTemplate,
        CheckName::SaturatedBrandNotIgnored,
        CheckName::AccentUsableOnWhite,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    pub fn pass(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            passed: false,
            detail: detail.into(),
        }
    }
}

pub type CheckResults = BTreeMap<CheckName, CheckOutcome>;

/// What the gate decided and why.
#[derive(Debug, Clone, Serialize)]
pub struct QualityGateReport {
    /// True iff every check in `checks` passed.
    pub passed: bool,
    pub checks: CheckResults,
    /// One line per color change, in the order they were made.
    pub adjustments: Vec<String>,
    /// Repair passes applied (0..=3).
    pub iterations: u32,
    pub original_colors: ColorScheme,
    pub final_colors: ColorScheme,
    pub monochrome: bool,
}

impl QualityGateReport {
    pub fn failing(&self) -> Vec<CheckName> {
        self.checks
            .iter()
            .filter(|(_, outcome)| !outcome.passed)
            .map(|(name, _)| *name)
            .collect()
    }
}
