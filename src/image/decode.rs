//! Base64 payload decoding via the `base64` and `image` crates.

use crate::image::Raster;
use crate::util::{GlyphMatchError, GlyphMatchResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Decodes a base64-encoded image container into a raster.
///
/// ASCII whitespace anywhere in the payload is ignored. Colour images become
/// 3-channel rasters (alpha is dropped); grey images keep a single channel.
pub fn decode_payload(payload: &[u8]) -> GlyphMatchResult<Raster> {
    let compact: Vec<u8> = payload
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(&compact)
        .map_err(|err| GlyphMatchError::Decode {
            reason: err.to_string(),
        })?;
    decode_image_bytes(&bytes)
}

/// Decodes raw (already base64-decoded) image container bytes.
pub fn decode_image_bytes(bytes: &[u8]) -> GlyphMatchResult<Raster> {
    let img = image::load_from_memory(bytes).map_err(|err| GlyphMatchError::Decode {
        reason: err.to_string(),
    })?;
    raster_from_dynamic(&img)
}

/// Converts a decoded `image` buffer into a raster.
pub fn raster_from_dynamic(img: &image::DynamicImage) -> GlyphMatchResult<Raster> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    if img.color().has_color() {
        Raster::from_rgb(img.to_rgb8().into_raw(), width, height)
    } else {
        Raster::from_gray(img.to_luma8().into_raw(), width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::decode_payload;
    use crate::GlyphMatchError;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use std::io::Cursor;

    fn png_payload(img: image::DynamicImage) -> String {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        STANDARD.encode(buf.into_inner())
    }

    #[test]
    fn decodes_rgb_png_dimensions() {
        let img = image::RgbImage::from_fn(7, 3, |x, _| image::Rgb([x as u8, 10, 20]));
        let payload = png_payload(image::DynamicImage::ImageRgb8(img));
        let raster = decode_payload(payload.as_bytes()).unwrap();
        assert_eq!(raster.width(), 7);
        assert_eq!(raster.height(), 3);
        assert_eq!(raster.channels(), 3);
        assert_eq!(raster.pixel(4, 1), Some(&[4u8, 10, 20][..]));
    }

    #[test]
    fn decodes_gray_png_with_trailing_newline() {
        let img = image::GrayImage::from_fn(4, 5, |_, y| image::Luma([y as u8 * 50]));
        let mut payload = png_payload(image::DynamicImage::ImageLuma8(img));
        payload.push('\n');
        let raster = decode_payload(payload.as_bytes()).unwrap();
        assert_eq!((raster.width(), raster.height()), (4, 5));
        assert_eq!(raster.channels(), 1);
        assert_eq!(raster.pixel(0, 2), Some(&[100u8][..]));
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = decode_payload(b"not base64!!").unwrap_err();
        assert!(matches!(err, GlyphMatchError::Decode { .. }));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let payload = STANDARD.encode(b"plain text, not an image");
        let err = decode_payload(payload.as_bytes()).unwrap_err();
        assert!(matches!(err, GlyphMatchError::Decode { .. }));
    }
}
