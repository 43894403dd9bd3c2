//! Image processing: pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` codecs behind [`ImageCodec`] |
//! | **EXIF orientation** | `kamadak-exif` |
//! | **Resample** | `image::imageops` filters behind [`Resizer`] |
//! | **Watermark** | per-pixel alpha blend |
//!
//! The module is split into:
//! - **Formats and parameters**: what to write ([`Format`], [`EncodeParams`], [`Quality`])
//! - **Codec**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Resizers**: [`Resizer`] / [`ResizerFactory`] traits + built-in strategies
//! - **Orientation** and **composite**: pure pixel transforms used by the pipeline

pub mod codec;
pub mod composite;
pub mod format;
pub mod orientation;
mod params;
pub mod resizer;
pub mod rust_codec;

pub use codec::{CodecError, Decoded, ImageCodec};
pub use format::Format;
pub use orientation::Orientation;
pub use params::{EncodeParams, Quality};
pub use resizer::{
    DefaultResizerFactory, FilterResizer, FixedResizerFactory, Interpolation, NullResizer,
    ProgressiveBilinearResizer, ResizeError, Resizer, ResizerFactory,
};
pub use rust_codec::RustCodec;
