//! Tile payload decoding.
//!
//! Tile messages inline their pixels as base64 PNG; the full-frame mode
//! delivers a raw RGBA buffer. Both paths produce [`TilePixels`]. A
//! failure here affects only the tile in question — the caller logs it and
//! moves on, and the slot refills on the next natural settle.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::cache::TilePixels;
use crate::error::StreamError;

/// Decode a base64-encoded PNG tile payload into RGBA pixels.
pub fn decode_tile_image(encoded: &str) -> Result<TilePixels, StreamError> {
    let png_bytes = BASE64.decode(encoded)?;
    let img = image::load_from_memory_with_format(&png_bytes, image::ImageFormat::Png)?;
    let rgba = img.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    Ok(TilePixels {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

/// Validate a raw RGBA buffer against the dimensions it claims to be.
pub fn decode_raw_frame(bytes: &[u8], width: u32, height: u32) -> Result<TilePixels, StreamError> {
    let expected = width as usize * height as usize * 4;
    if bytes.len() != expected {
        return Err(StreamError::PayloadLength {
            got: bytes.len(),
            expected,
            width,
            height,
        });
    }
    Ok(TilePixels {
        width,
        height,
        rgba: bytes.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode a tiny RGBA image to base64 PNG, the inverse of the decoder.
    fn encode_png(width: u32, height: u32, rgba: &[u8]) -> String {
        let img = image::RgbaImage::from_raw(width, height, rgba.to_vec()).unwrap();
        let mut png_bytes = Vec::new();
        image::ImageEncoder::write_image(
            image::codecs::png::PngEncoder::new(std::io::Cursor::new(&mut png_bytes)),
            img.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        BASE64.encode(&png_bytes)
    }

    #[test]
    fn decodes_png_tile_payload() {
        let rgba = vec![10, 20, 30, 255].repeat(4);
        let encoded = encode_png(2, 2, &rgba);

        let pixels = decode_tile_image(&encoded).unwrap();
        assert_eq!(pixels.width, 2);
        assert_eq!(pixels.height, 2);
        assert_eq!(pixels.rgba, rgba);
    }

    #[test]
    fn rejects_bad_base64() {
        assert!(matches!(
            decode_tile_image("not!!base64"),
            Err(StreamError::PayloadEncoding(_))
        ));
    }

    #[test]
    fn rejects_non_png_bytes() {
        let encoded = BASE64.encode(b"these are not png bytes");
        assert!(matches!(
            decode_tile_image(&encoded),
            Err(StreamError::ImageDecode(_))
        ));
    }

    #[test]
    fn raw_frame_requires_exact_length() {
        let ok = decode_raw_frame(&[0u8; 2 * 3 * 4], 2, 3).unwrap();
        assert_eq!(ok.width, 2);
        assert_eq!(ok.height, 3);

        let err = decode_raw_frame(&[0u8; 10], 2, 3);
        assert!(matches!(
            err,
            Err(StreamError::PayloadLength {
                got: 10,
                expected: 24,
                ..
            })
        ));
    }
}
