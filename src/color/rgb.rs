// THEORY:
// `Rgb` is an opaque sRGB color with a canonical `#rrggbb` text form. It stores only
// the three channel bytes; hue, saturation, lightness and WCAG luminance are derived
// on demand through the same math the raster layer uses, so a derived attribute can
// never drift from the color it describes.

use crate::core_modules::pixel::{self, Pixel};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (alpha dropped), with or without `#`.
    pub fn parse(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Some(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            6 | 8 => Some(Self::new(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
            _ => None,
        }
    }

    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
        let (r, g, b) = pixel::hsl_to_rgb(hue, saturation, lightness);
        let to_byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(to_byte(r), to_byte(g), to_byte(b))
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn hsl(&self) -> (f64, f64, f64) {
        pixel::rgb_to_hsl(self.r as f64 / 255.0, self.g as f64 / 255.0, self.b as f64 / 255.0)
    }

    pub fn hue(&self) -> f64 {
        self.hsl().0
    }

    pub fn saturation(&self) -> f64 {
        self.hsl().1
    }

    pub fn lightness(&self) -> f64 {
        self.hsl().2
    }

    pub fn relative_luminance(&self) -> f64 {
        pixel::relative_luminance(self.r, self.g, self.b)
    }

    /// WCAG contrast ratio (1.0..=21.0).
    pub fn contrast_ratio(&self, other: &Rgb) -> f64 {
        let a = self.relative_luminance();
        let b = other.relative_luminance();
        (a.max(b) + 0.05) / (a.min(b) + 0.05)
    }

    pub fn is_neutral(&self, saturation_threshold: f64) -> bool {
        self.saturation() < saturation_threshold
    }

    pub fn with_lightness(&self, lightness: f64) -> Self {
        let (h, s, _) = self.hsl();
        Self::from_hsl(h, s, lightness)
    }

    pub fn with_saturation(&self, saturation: f64) -> Self {
        let (h, _, l) = self.hsl();
        Self::from_hsl(h, saturation, l)
    }

    /// Gray of the same HSL lightness.
    pub fn desaturated(&self) -> Self {
        Self::from_hsl(0.0, 0.0, self.lightness())
    }

    /// Smallest hue angle between the two colors, in degrees.
    pub fn hue_distance(&self, other: &Rgb) -> f64 {
        pixel::hue_distance(self.hue(), other.hue())
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::parse(s).ok_or_else(|| format!("not a hex color: {s:?}"))
    }
}

impl From<Pixel> for Rgb {
    fn from(pixel: Pixel) -> Self {
        Rgb::new(pixel.red, pixel.green, pixel.blue)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
