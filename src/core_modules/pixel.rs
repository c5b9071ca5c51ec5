// THEORY (Single-Pixel Heuristics):
// `Pixel` is the smallest unit of the analysis layer: a plain RGBA container plus the
// metrics that can be computed from that pixel alone. Anything that needs a neighbor
// (gradients, flood fills, grid activity) lives in the higher-level modules.
//
// Heuristic families:
// - Brightness: Rec. 601 luma for edge and binarization work, WCAG relative luminance
//   (sRGB linearized through a 256-entry LUT) for contrast math.
// - Color strength: chroma, HSL saturation and lightness.
// - Hue: angle on the color wheel in degrees [0, 360).
// - Distance: summed and maximum absolute channel difference to another pixel.
//
// The HSL helpers are free functions over normalized channels so the color-scheme
// layer (`color::rgb`) shares exactly the same math as the raster layer.

use std::sync::OnceLock;

pub type Channel = u8;
pub type Hue = f64;
pub type Luminance = f64;

const CHANNELS: usize = 4;

static SRGB_TO_LINEAR_LUT: OnceLock<[f64; 256]> = OnceLock::new();

/// sRGB byte to linear-light 0..1, via a lazily built lookup table.
#[inline]
pub fn srgb_to_linear(value: Channel) -> f64 {
    let table = SRGB_TO_LINEAR_LUT.get_or_init(|| {
        let mut table = [0.0f64; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let normalized = i as f64 / 255.0;
            *slot = if normalized <= 0.04045 {
                normalized / 12.92
            } else {
                ((normalized + 0.055) / 1.055).powf(2.4)
            };
        }
        table
    });
    table[value as usize]
}

/// WCAG 2.x relative luminance of an sRGB triple.
pub fn relative_luminance(red: Channel, green: Channel, blue: Channel) -> Luminance {
    0.2126 * srgb_to_linear(red) + 0.7152 * srgb_to_linear(green) + 0.0722 * srgb_to_linear(blue)
}

/// Converts normalized RGB (0..1) to (hue degrees, HSL saturation, HSL lightness).
pub fn rgb_to_hsl(red: f64, green: f64, blue: f64) -> (Hue, f64, f64) {
    let maximum = red.max(green.max(blue));
    let minimum = red.min(green.min(blue));
    let chroma = maximum - minimum;
    let lightness = (maximum + minimum) * 0.5;

    if chroma <= 1e-9 {
        return (0.0, 0.0, lightness);
    }

    let denominator = 1.0 - (2.0 * lightness - 1.0).abs();
    let saturation = if denominator <= 1e-9 {
        0.0
    } else {
        (chroma / denominator).min(1.0)
    };

    let (base_difference, sector_offset) = if maximum == red {
        (green - blue, 0.0)
    } else if maximum == green {
        (blue - red, 2.0)
    } else {
        (red - green, 4.0)
    };

    let mut hue = (base_difference / chroma + sector_offset) * 60.0;
    if hue < 0.0 {
        hue += 360.0;
    }
    if hue >= 360.0 {
        hue -= 360.0;
    }
    (hue, saturation, lightness)
}

/// Converts (hue degrees, saturation 0..1, lightness 0..1) back to normalized RGB.
pub fn hsl_to_rgb(hue: Hue, saturation: f64, lightness: f64) -> (f64, f64, f64) {
    let saturation = saturation.clamp(0.0, 1.0);
    let lightness = lightness.clamp(0.0, 1.0);
    let hue = hue.rem_euclid(360.0);

    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue / 60.0;
    let secondary = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, secondary, 0.0),
        1 => (secondary, chroma, 0.0),
        2 => (0.0, chroma, secondary),
        3 => (0.0, secondary, chroma),
        4 => (secondary, 0.0, chroma),
        _ => (chroma, 0.0, secondary),
    };
    let offset = lightness - chroma * 0.5;
    (r + offset, g + offset, b + offset)
}

/// Smallest angular distance between two hues, in degrees (0..=180).
pub fn hue_distance(a: Hue, b: Hue) -> f64 {
    let difference = (a - b).rem_euclid(360.0);
    difference.min(360.0 - difference)
}

/// A "dumb" data container representing a single RGBA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Pixel {
    /// The red channel value (0-255).
    pub red: Channel,
    /// The green channel value (0-255).
    pub green: Channel,
    /// The blue channel value (0-255).
    pub blue: Channel,
    /// The alpha (transparency) channel value (0-255).
    pub alpha: Channel,
}

impl Pixel {
    pub const WHITE: Pixel = Pixel::opaque(255, 255, 255);

    pub const fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
        Pixel {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub const fn opaque(red: Channel, green: Channel, blue: Channel) -> Self {
        Pixel::new(red, green, blue, 255)
    }

    /// Composites this pixel over an opaque background and returns an opaque pixel.
    pub fn flatten_over(&self, background: Pixel) -> Pixel {
        if self.alpha == 255 {
            return *self;
        }
        let alpha = self.alpha as u32;
        let blend = |fg: Channel, bg: Channel| -> Channel {
            ((fg as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as Channel
        };
        Pixel::opaque(
            blend(self.red, background.red),
            blend(self.green, background.green),
            blend(self.blue, background.blue),
        )
    }

    /// Luminance estimate (Rec. 601 luma) on the 0..255 scale.
    pub fn luminance(&self) -> Luminance {
        0.299 * self.red as f64 + 0.587 * self.green as f64 + 0.114 * self.blue as f64
    }

    /// WCAG relative luminance (0..1), alpha ignored.
    pub fn relative_luminance(&self) -> Luminance {
        relative_luminance(self.red, self.green, self.blue)
    }

    fn normalized(&self) -> (f64, f64, f64) {
        (
            self.red as f64 / 255.0,
            self.green as f64 / 255.0,
            self.blue as f64 / 255.0,
        )
    }

    /// Hue angle in degrees [0, 360); 0.0 for grays.
    pub fn hue(&self) -> Hue {
        let (r, g, b) = self.normalized();
        rgb_to_hsl(r, g, b).0
    }

    /// Saturation (HSL): chroma / (1 - |2L - 1|).
    pub fn saturation_hsl(&self) -> f64 {
        let (r, g, b) = self.normalized();
        rgb_to_hsl(r, g, b).1
    }

    /// HSL lightness: midpoint of the max and min channels (0..1).
    pub fn lightness_hsl(&self) -> f64 {
        let (r, g, b) = self.normalized();
        rgb_to_hsl(r, g, b).2
    }

    /// Chroma: max(R,G,B) - min(R,G,B), on the 0..255 scale.
    pub fn chroma(&self) -> u8 {
        self.red.max(self.green.max(self.blue)) - self.red.min(self.green.min(self.blue))
    }

    /// Sum of absolute RGB differences (0..765).
    pub fn channel_distance(&self, other: &Pixel) -> u32 {
        self.red.abs_diff(other.red) as u32
            + self.green.abs_diff(other.green) as u32
            + self.blue.abs_diff(other.blue) as u32
    }

    /// Largest single-channel difference (0..255).
    pub fn max_channel_distance(&self, other: &Pixel) -> u8 {
        self.red
            .abs_diff(other.red)
            .max(self.green.abs_diff(other.green))
            .max(self.blue.abs_diff(other.blue))
    }

    /// Bucket key after rounding each channel down to a multiple of `bucket_size`.
    pub fn quantized(&self, bucket_size: u8) -> (u8, u8, u8) {
        let bucket = bucket_size.max(1);
        (self.red / bucket, self.green / bucket, self.blue / bucket)
    }
}

impl From<&[u8]> for Pixel {
    fn from(bytes: &[u8]) -> Self {
        match bytes.len() {
            CHANNELS => Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3]),
            3 => Pixel::opaque(bytes[0], bytes[1], bytes[2]),
            _ => Pixel::default(),
        }
    }
}

impl From<image::Rgba<u8>> for Pixel {
    fn from(rgba: image::Rgba<u8>) -> Self {
        let [red, green, blue, alpha] = rgba.0;
        Pixel::new(red, green, blue, alpha)
    }
}

impl From<Pixel> for image::Rgba<u8> {
    fn from(pixel: Pixel) -> Self {
        image::Rgba([pixel.red, pixel.green, pixel.blue, pixel.alpha])
    }
}
