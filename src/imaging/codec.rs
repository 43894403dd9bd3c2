//! Codec trait and shared types.
//!
//! The [`ImageCodec`] trait is the only place pixels meet bytes: decoding
//! (with the EXIF orientation and native format) and encoding (with the
//! resolved format, quality and format type). Everything else in the crate
//! works on decoded [`DynamicImage`]s.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec): pure Rust, statically linked.

use super::format::Format;
use super::orientation::Orientation;
use super::params::EncodeParams;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// A decoded source image, still in its stored (un-rotated) orientation.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub image: DynamicImage,
    pub orientation: Orientation,
    /// Format the bytes were stored in, if the codec could tell.
    pub format: Option<Format>,
}

/// Trait for image codecs.
///
/// Implementations must be `Sync`: batches decode and encode from rayon
/// workers sharing one codec.
pub trait ImageCodec: Send + Sync {
    /// Decode bytes into pixels, reporting orientation and native format.
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, CodecError>;

    /// Encode pixels with already-resolved output parameters.
    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use std::sync::Mutex;

    /// Bytes that make [`MockCodec::decode`] fail.
    pub const CORRUPT: &[u8] = b"corrupt";

    /// Mock codec that records operations and hands out a fixed image.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    pub struct MockCodec {
        pub decoded: Decoded,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Encode {
            format: Format,
            width: u32,
            height: u32,
            quality: Option<u8>,
            format_type: Option<String>,
        },
    }

    impl MockCodec {
        pub fn with_image(image: DynamicImage, orientation: Orientation, format: Option<Format>) -> Self {
            Self {
                decoded: Decoded {
                    image,
                    orientation,
                    format,
                },
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageCodec for MockCodec {
        fn decode(&self, bytes: &[u8]) -> Result<Decoded, CodecError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(bytes.len()));
            if bytes == CORRUPT {
                return Err(CodecError::Decode("mock corrupt input".into()));
            }
            Ok(self.decoded.clone())
        }

        fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                format: params.format,
                width: image.width(),
                height: image.height(),
                quality: params.quality.map(Quality::percent),
                format_type: params.format_type.clone(),
            });
            Ok(format!("{}:{}x{}", params.format, image.width(), image.height()).into_bytes())
        }
    }

    #[test]
    fn mock_records_decode_and_encode() {
        let codec = MockCodec::with_image(DynamicImage::new_rgb8(8, 6), Orientation::Normal, None);

        let decoded = codec.decode(b"12345").unwrap();
        assert_eq!(decoded.image.width(), 8);

        let bytes = codec
            .encode(
                &decoded.image,
                &EncodeParams {
                    format: Format::Jpeg,
                    quality: Some(Quality::new(0.8)),
                    format_type: None,
                },
            )
            .unwrap();
        assert_eq!(bytes, b"jpeg:8x6");

        let ops = codec.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], RecordedOp::Decode(5)));
        assert!(matches!(
            &ops[1],
            RecordedOp::Encode {
                format: Format::Jpeg,
                quality: Some(80),
                ..
            }
        ));
    }

    #[test]
    fn mock_fails_on_corrupt_bytes() {
        let codec = MockCodec::with_image(DynamicImage::new_rgb8(1, 1), Orientation::Normal, None);
        assert!(matches!(codec.decode(CORRUPT), Err(CodecError::Decode(_))));
    }
}
