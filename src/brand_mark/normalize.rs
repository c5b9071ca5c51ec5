// THEORY:
// A selected mark always leaves the selector as a square image. Very wide marks are
// wordmarks with a symbol on the left, so the leftmost foreground run is cropped out
// first; everything is then centered on a transparent square canvas and resized to the
// output size. Column runs are measured on the full-resolution pixels so a thin gap
// between symbol and lettering is not lost to downscaling.

use crate::assets::imaging::{self, PNG_MIME};
use crate::config::BrandMarkConfig;
use crate::core_modules::raster::Raster;
use crate::core_modules::region::{FOREGROUND_LUMA_THRESHOLD, foreground_column_runs};
use crate::error::AssetResult;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbaImage};

/// A leftmost run wider than this share of the image is the whole wordmark, not a symbol.
const MAX_SYMBOL_SHARE: f64 = 0.9;

/// Crops a wide wordmark to its leftmost mark, or returns `None` when there is no
/// separable mark.
pub fn crop_leftmost_mark(image: &DynamicImage) -> Option<DynamicImage> {
    let (width, height) = image.dimensions();
    let raster = Raster::from_rgba(&image.to_rgba8());
    let min_gap = (height / 4).max(2);
    let runs = foreground_column_runs(&raster, FOREGROUND_LUMA_THRESHOLD, min_gap);
    let (start, end) = *runs.first()?;
    if runs.len() < 2 || (end - start) as f64 > width as f64 * MAX_SYMBOL_SHARE {
        return None;
    }
    Some(image.crop_imm(start, 0, end - start, height))
}

/// Centers the image on a transparent square canvas of its longest side.
pub fn pad_to_square(image: &DynamicImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let side = width.max(height);
    let mut canvas = RgbaImage::new(side, side);
    let x = (side - width) / 2;
    let y = (side - height) / 2;
    imageops::overlay(&mut canvas, &image.to_rgba8(), x as i64, y as i64);
    canvas
}

/// Crop (for wordmarks), pad and resize to the configured square size.
pub fn normalize_to_square(image: &DynamicImage, config: &BrandMarkConfig) -> DynamicImage {
    let (width, height) = image.dimensions();
    let aspect = width as f64 / height.max(1) as f64;
    let cropped = if aspect >= config.wide_wordmark_ratio {
        crop_leftmost_mark(image)
    } else {
        None
    };
    let square = pad_to_square(cropped.as_ref().unwrap_or(image));
    let size = config.output_size;
    DynamicImage::ImageRgba8(imageops::resize(&square, size, size, FilterType::Lanczos3))
}

/// The normalized mark as a PNG `data:` URL.
pub fn normalized_mark_data_url(image: &DynamicImage, config: &BrandMarkConfig) -> AssetResult<String> {
    let normalized = normalize_to_square(image, config);
    let bytes = imaging::encode_png(&normalized)?;
    Ok(imaging::to_data_url(PNG_MIME, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const INK: Rgba<u8> = Rgba([15, 23, 42, 255]);
    const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

    /// A 40px symbol, a 30px gap, then 150px of "lettering" with 6px gaps.
    fn wordmark() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(300, 60, |x, y| {
            let inside_rows = (10..50).contains(&y);
            let symbol = (10..50).contains(&x);
            let letters = (80..230).contains(&x) && (x - 80) % 20 < 14;
            if inside_rows && (symbol || letters) { INK } else { PAPER }
        }))
    }

    #[test]
    fn wide_wordmark_is_cropped_to_its_symbol() {
        let cropped = crop_leftmost_mark(&wordmark()).unwrap();
        assert_eq!(cropped.dimensions(), (40, 60));
    }

    #[test]
    fn output_is_square_at_the_configured_size() {
        let config = BrandMarkConfig::default();
        for image in [wordmark(), DynamicImage::ImageRgba8(RgbaImage::from_pixel(30, 90, INK))] {
            let normalized = normalize_to_square(&image, &config);
            assert_eq!(normalized.dimensions(), (config.output_size, config.output_size));
        }
    }

    #[test]
    fn padding_is_transparent() {
        let square = pad_to_square(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 4, INK)));
        assert_eq!(square.dimensions(), (10, 10));
        assert_eq!(square.get_pixel(0, 0)[3], 0);
        assert_eq!(*square.get_pixel(5, 5), INK);
    }

    #[test]
    fn data_url_is_png() {
        let url = normalized_mark_data_url(&wordmark(), &BrandMarkConfig::default()).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }
}
