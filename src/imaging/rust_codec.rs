//! Pure Rust codec built on the `image` crate. Everything is statically
//! linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff format | `image::guess_format` |
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::load_from_memory_with_format` |
//! | EXIF orientation | `kamadak-exif` via [`read_exif_orientation`] |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → PNG | `PngEncoder::new_with_quality` (`fast` / `best` compression) |
//! | Encode → WebP | `WebPEncoder::new_lossless` |
//! | Encode → AVIF | `AvifEncoder::new_with_speed_quality` (rav1e, speed 6) |
//! | Encode → GIF, BMP, TIFF | `DynamicImage::write_to` |
//!
//! Encoders only accept some pixel layouts, so the image is converted to the
//! closest layout the target format takes before writing (JPEG drops alpha,
//! 16-bit data is narrowed for 8-bit-only formats).

use super::codec::{CodecError, Decoded, ImageCodec};
use super::format::Format;
use super::orientation::read_exif_orientation;
use super::params::EncodeParams;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage};
use std::borrow::Cow;
use std::io::Cursor;

/// AVIF encoder speed (1 slowest - 10 fastest).
const AVIF_SPEED: u8 = 6;

/// Pure Rust codec using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl ImageCodec for RustCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, CodecError> {
        let guessed = image::guess_format(bytes)
            .map_err(|_| CodecError::UnsupportedFormat("unrecognized image data".into()))?;
        let format = Format::from_image_format(guessed)
            .filter(|format| format.readable())
            .ok_or_else(|| {
                CodecError::UnsupportedFormat(format!("cannot decode {guessed:?} input"))
            })?;

        let image = image::load_from_memory_with_format(bytes, guessed)
            .map_err(|e| CodecError::Decode(format!("{format}: {e}")))?;

        Ok(Decoded {
            image,
            orientation: read_exif_orientation(bytes),
            format: Some(format),
        })
    }

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
        let image = coerce_color(image, params.format);
        let mut buffer = Cursor::new(Vec::new());
        let quality = params.quality.unwrap_or_default();

        let written = match params.format {
            Format::Jpeg => image.write_with_encoder(JpegEncoder::new_with_quality(
                &mut buffer,
                quality.percent(),
            )),
            Format::Png => {
                let compression = match params.format_type.as_deref() {
                    Some("fast") => CompressionType::Fast,
                    Some("best") => CompressionType::Best,
                    _ => CompressionType::Default,
                };
                image.write_with_encoder(PngEncoder::new_with_quality(
                    &mut buffer,
                    compression,
                    PngFilter::Adaptive,
                ))
            }
            Format::WebP => image.write_with_encoder(WebPEncoder::new_lossless(&mut buffer)),
            Format::Avif => image.write_with_encoder(AvifEncoder::new_with_speed_quality(
                &mut buffer,
                AVIF_SPEED,
                quality.percent(),
            )),
            Format::Gif | Format::Bmp | Format::Tiff => {
                image.write_to(&mut buffer, params.format.to_image_format())
            }
        };

        written.map_err(|e| CodecError::Encode(format!("{}: {e}", params.format)))?;
        Ok(buffer.into_inner())
    }
}

/// Convert to a pixel layout the encoder for `format` accepts.
fn coerce_color(image: &DynamicImage, format: Format) -> Cow<'_, DynamicImage> {
    let color = image.color();
    let converted = match format {
        Format::Jpeg => match color {
            ColorType::L8 | ColorType::Rgb8 => None,
            ColorType::L16 | ColorType::La8 | ColorType::La16 => {
                Some(DynamicImage::ImageLuma8(image.to_luma8()))
            }
            _ => Some(DynamicImage::ImageRgb8(image.to_rgb8())),
        },
        Format::Png => match color {
            ColorType::Rgb32F => Some(DynamicImage::ImageRgb16(image.to_rgb16())),
            ColorType::Rgba32F => Some(DynamicImage::ImageRgba16(image.to_rgba16())),
            _ => None,
        },
        Format::Gif => (color != ColorType::Rgba8).then(|| DynamicImage::ImageRgba8(image.to_rgba8())),
        Format::Bmp | Format::WebP => match color {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => None,
            _ => Some(narrow_to_8bit(image)),
        },
        Format::Tiff => match color {
            ColorType::La8 | ColorType::La16 => Some(DynamicImage::ImageRgba8(image.to_rgba8())),
            _ => None,
        },
        Format::Avif => match color {
            ColorType::Rgb8 | ColorType::Rgba8 => None,
            _ => Some(narrow_to_8bit(image)),
        },
    };
    match converted {
        Some(image) => Cow::Owned(image),
        None => Cow::Borrowed(image),
    }
}

fn narrow_to_8bit(image: &DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}
