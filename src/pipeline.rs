//! Per-input processing as a chain of owned stages.
//!
//! ```text
//! Decoded ──extract_region──▶ RegionExtracted ──resize──▶ Resized
//!     ──crop──▶ Cropped ──watermark──▶ Watermarked ──encode──▶ Encoded
//! ```
//!
//! Each transition consumes the previous [`Stage`] and hands its buffer on,
//! so no two stages ever see the same pixels. A failed transition ends the
//! chain for that input only; the shared [`ThumbnailSpec`] is never touched.
//!
//! All geometry after [`Stage::decoded`] is in the displayed (EXIF-corrected)
//! frame.

use crate::geometry::{Position, Region, Size};
use crate::imaging::composite::apply_watermark;
use crate::imaging::{
    CodecError, DefaultResizerFactory, EncodeParams, Format, ImageCodec, ResizeError, Resizer,
    ResizerFactory,
};
use crate::sizing::calculate_target;
use crate::spec::{ResizeStrategy, SpecError, ThumbnailSpec};
use image::{DynamicImage, GenericImageView};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Why one input failed.
#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Resize(#[from] ResizeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),
    #[error("Input has no name to derive an output file name from")]
    MissingSourceName,
}

/// Marker types for the pipeline stages.
pub mod stage {
    #[derive(Debug)]
    pub enum Decoded {}
    #[derive(Debug)]
    pub enum RegionExtracted {}
    #[derive(Debug)]
    pub enum Resized {}
    #[derive(Debug)]
    pub enum Cropped {}
    #[derive(Debug)]
    pub enum Watermarked {}
}

/// Pixels at a given stage, plus the format they were decoded from.
#[derive(Debug)]
pub struct Stage<S> {
    image: DynamicImage,
    native: Option<Format>,
    _stage: PhantomData<S>,
}

/// Final output of the byte and file terminals.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub format: Format,
}

impl<S> Stage<S> {
    fn next<T>(self, image: DynamicImage) -> Stage<T> {
        Stage {
            image,
            native: self.native,
            _stage: PhantomData,
        }
    }

    /// Advance without touching the pixels.
    fn pass<T>(self) -> Stage<T> {
        Stage {
            image: self.image,
            native: self.native,
            _stage: PhantomData,
        }
    }

    pub fn size(&self) -> Size {
        let (width, height) = self.image.dimensions();
        Size::new(width, height)
    }

    pub fn native_format(&self) -> Option<Format> {
        self.native
    }
}

impl Stage<stage::Decoded> {
    /// Take a codec result, applying its orientation unless the spec opts out.
    pub fn decoded(decoded: crate::imaging::Decoded, spec: &ThumbnailSpec) -> Self {
        let image = if spec.use_exif_orientation() {
            decoded.orientation.normalize(decoded.image)
        } else {
            decoded.image
        };
        Self {
            image,
            native: decoded.format,
            _stage: PhantomData,
        }
    }

    /// Start from pixels supplied by the caller; there is no native format.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image,
            native: None,
            _stage: PhantomData,
        }
    }

    pub fn extract_region(
        self,
        spec: &ThumbnailSpec,
    ) -> Result<Stage<stage::RegionExtracted>, ThumbnailError> {
        let Some(region) = spec.source_region() else {
            return Ok(self.pass());
        };
        let rect = region.calculate(self.size())?;
        debug!("Source region {}x{} at ({}, {})", rect.width, rect.height, rect.x, rect.y);
        let image = self.image.crop_imm(rect.x, rect.y, rect.width, rect.height);
        Ok(self.next(image))
    }
}

impl Stage<stage::RegionExtracted> {
    pub fn resize(self, spec: &ThumbnailSpec) -> Result<Stage<stage::Resized>, ThumbnailError> {
        let source = self.size();
        let target = calculate_target(source, spec.sizing(), spec.aspect(), spec.fit_mode())?;
        let resizer = select_resizer(spec, source, target);
        debug!("Resizing {source} -> {target}");

        let resized = resizer.resize(&self.image, target)?;
        let (width, height) = resized.dimensions();
        let actual = Size::new(width, height);
        if actual != target {
            return Err(ResizeError::WrongSize {
                expected: target,
                actual,
            }
            .into());
        }
        Ok(self.next(resized))
    }
}

impl Stage<stage::Resized> {
    /// Cut the requested box out of a cover-fit resize at the crop anchor.
    pub fn crop(self, spec: &ThumbnailSpec) -> Result<Stage<stage::Cropped>, ThumbnailError> {
        let (Some(anchor), Some(requested)) = (spec.crop(), spec.requested_box()) else {
            return Ok(self.pass());
        };
        let canvas = self.size();
        let window = requested.min(canvas);
        let origin = anchor.resolve(canvas, window, 0);
        let rect = Region::new(Position::At(origin), window).calculate(canvas)?;
        debug!("Cropping {canvas} to {}x{} at ({}, {})", rect.width, rect.height, rect.x, rect.y);
        let image = self.image.crop_imm(rect.x, rect.y, rect.width, rect.height);
        Ok(self.next(image))
    }
}

impl Stage<stage::Cropped> {
    /// Composite every watermark, in the order they were added.
    pub fn watermark(self, spec: &ThumbnailSpec) -> Stage<stage::Watermarked> {
        if spec.watermarks().is_empty() {
            return self.pass();
        }
        let mut stage: Stage<stage::Watermarked> = self.pass();
        for watermark in spec.watermarks() {
            debug!("Watermark at {:?}", watermark.position);
            stage.image = apply_watermark(stage.image, watermark);
        }
        stage
    }
}

impl Stage<stage::Watermarked> {
    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    /// Apply the pixel-format override and encode with resolved settings.
    pub fn encode(
        self,
        spec: &ThumbnailSpec,
        codec: &dyn ImageCodec,
        params: &EncodeParams,
    ) -> Result<Encoded, ThumbnailError> {
        let image = match spec.image_type() {
            Some(pixel_format) => pixel_format.convert(self.image),
            None => self.image,
        };
        debug!("Encoding {}x{} as {}", image.width(), image.height(), params.format);
        let bytes = codec.encode(&image, params)?;
        Ok(Encoded {
            bytes,
            format: params.format,
        })
    }
}

/// Run every pixel stage: region, resize, crop, watermarks.
pub fn render(
    start: Stage<stage::Decoded>,
    spec: &ThumbnailSpec,
) -> Result<Stage<stage::Watermarked>, ThumbnailError> {
    Ok(start
        .extract_region(spec)?
        .resize(spec)?
        .crop(spec)?
        .watermark(spec))
}

/// The resizer for one input, by strategy precedence: explicit instance,
/// factory, scaling mode, then the default factory.
pub fn select_resizer(spec: &ThumbnailSpec, source: Size, target: Size) -> Arc<dyn Resizer> {
    match spec.resize_strategy() {
        ResizeStrategy::Explicit(resizer) => Arc::clone(resizer),
        ResizeStrategy::Factory(factory) => factory.select(source, target),
        ResizeStrategy::ScalingMode(mode) => mode.resizer(spec.hints()),
        ResizeStrategy::Default => DefaultResizerFactory::new(spec.hints()).select(source, target),
    }
}
