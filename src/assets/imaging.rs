// THEORY:
// Thin wrappers over the `image` crate. Decoding sniffs the format from the bytes, so
// a PNG served as `image/x-icon` still decodes. Resizing is shrink-only and keeps the
// aspect ratio. Encoders write into memory and hand back bytes that `to_data_url`
// turns into a self-contained `data:` URL for the caller.

use crate::error::{AssetError, AssetResult};
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

pub const PNG_MIME: &str = "image/png";
pub const JPEG_MIME: &str = "image/jpeg";

/// Decodes any supported raster format. Zero-sized images are rejected.
pub fn decode(bytes: &[u8]) -> AssetResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(AssetError::decode("empty body"));
    }
    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(AssetError::decode("image has no pixels"));
    }
    Ok(image)
}

/// Shrinks so neither side exceeds `max_side`, preserving aspect ratio. Never enlarges.
pub fn resize_to_fit(image: DynamicImage, max_side: u32) -> DynamicImage {
    if image.width() <= max_side && image.height() <= max_side {
        return image;
    }
    image.resize(max_side, max_side, FilterType::Lanczos3)
}

pub fn encode_png(image: &DynamicImage) -> AssetResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Encodes as baseline JPEG. Alpha is dropped; callers flatten first if it matters.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> AssetResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)))?;
    Ok(bytes)
}

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::fetch::decode_data_url;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255])))
    }

    #[test]
    fn garbage_bytes_do_not_decode() {
        assert!(decode(b"").is_err());
        assert!(decode(b"<html>not an image</html>").is_err());
    }

    #[test]
    fn png_survives_a_data_url_trip() {
        let bytes = encode_png(&solid(12, 7)).unwrap();
        let url = to_data_url(PNG_MIME, &bytes);
        assert!(url.starts_with("data:image/png;base64,"));
        let decoded = decode(&decode_data_url(&url).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 7));
    }

    #[test]
    fn resize_only_shrinks() {
        let small = resize_to_fit(solid(40, 20), 100);
        assert_eq!((small.width(), small.height()), (40, 20));
        let large = resize_to_fit(solid(400, 200), 100);
        assert_eq!((large.width(), large.height()), (100, 50));
    }

    #[test]
    fn jpeg_output_is_a_jpeg() {
        let bytes = encode_jpeg(&solid(32, 32), 85).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }
}
