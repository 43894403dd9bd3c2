//! Fluent entry point: pick inputs, chain directives, call a terminal.
//!
//! ```no_run
//! use thumbwright::geometry::Position;
//! use thumbwright::thumbnails::Thumbnails;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let written = Thumbnails::of_paths(["photo.jpg"])?
//!     .size(160, 160)?
//!     .crop(Position::Center)?
//!     .output_format("png")?
//!     .to_file("thumb.png")?;
//! println!("wrote {}", written.display());
//! # Ok(())
//! # }
//! ```
//!
//! Every directive validates immediately and returns the builder, so a bad
//! chain fails at the offending call. Terminals freeze the spec and run the
//! pipeline once per input.
//!
//! ## Terminals
//!
//! | Terminal | Inputs | Result |
//! |---|---|---|
//! | [`as_image`](Thumbnails::as_image), [`as_bytes`](Thumbnails::as_bytes), [`to_file`](Thumbnails::to_file) | exactly one | the value or the input's error |
//! | [`as_images`](Thumbnails::as_images), [`as_bytes_all`](Thumbnails::as_bytes_all), [`to_files`](Thumbnails::to_files), [`to_dir`](Thumbnails::to_dir), [`as_files`](Thumbnails::as_files) | any | one [`Outcome`] per input, in input order |
//!
//! Batch terminals run inputs in parallel on the rayon pool. One input
//! failing never affects another; only a spec that cannot be frozen fails
//! the whole call.

use crate::builder::{Directive, SpecBuilder};
use crate::geometry::{Coordinate, Position, Size};
use crate::imaging::{ImageCodec, Resizer, ResizerFactory, RustCodec};
use crate::naming::Rename;
use crate::pipeline::{self, Encoded, ThumbnailError};
use crate::resolve::resolve_output;
use crate::source::Source;
use crate::spec::{
    AlphaInterpolation, Antialiasing, Dithering, PixelFormat, Rendering, ScalingMode, SpecError,
    ThumbnailSpec,
};
use image::DynamicImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result for one input of a batch.
#[derive(Debug)]
pub struct Outcome<T> {
    /// Input label: its path, its name, or `input #N`.
    pub name: String,
    pub result: Result<T, ThumbnailError>,
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct Thumbnails {
    sources: Vec<Source>,
    builder: SpecBuilder,
    codec: Arc<dyn ImageCodec>,
}

impl Thumbnails {
    pub fn of_sources(sources: Vec<Source>) -> Result<Self, SpecError> {
        if sources.is_empty() {
            return Err(SpecError::InvalidArgument("no inputs given".into()));
        }
        Ok(Self {
            sources,
            builder: SpecBuilder::new(),
            codec: Arc::new(RustCodec::new()),
        })
    }

    pub fn of_paths<I, P>(paths: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::of_sources(paths.into_iter().map(|p| Source::Path(p.into())).collect())
    }

    pub fn of_images(images: impl IntoIterator<Item = DynamicImage>) -> Result<Self, SpecError> {
        Self::of_sources(images.into_iter().map(Source::image).collect())
    }

    pub fn of_bytes(buffers: impl IntoIterator<Item = Vec<u8>>) -> Result<Self, SpecError> {
        Self::of_sources(buffers.into_iter().map(Source::bytes).collect())
    }

    /// Replace the default [`RustCodec`].
    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn codec(&self) -> &dyn ImageCodec {
        self.codec.as_ref()
    }

    /// The spec as configured so far.
    pub fn spec(&self) -> &ThumbnailSpec {
        self.builder.spec()
    }

    pub fn apply(mut self, directive: Directive) -> Result<Self, SpecError> {
        self.builder.apply(directive)?;
        Ok(self)
    }

    // =========================================================================
    // Sizing
    // =========================================================================

    pub fn size(self, width: u32, height: u32) -> Result<Self, SpecError> {
        self.apply(Directive::Size { width, height })
    }

    pub fn width(self, width: u32) -> Result<Self, SpecError> {
        self.apply(Directive::Width(width))
    }

    pub fn height(self, height: u32) -> Result<Self, SpecError> {
        self.apply(Directive::Height(height))
    }

    pub fn bounds(self, width: u32, height: u32) -> Result<Self, SpecError> {
        self.apply(Directive::Bounds { width, height })
    }

    pub fn force_size(self, width: u32, height: u32) -> Result<Self, SpecError> {
        self.apply(Directive::ForceSize { width, height })
    }

    pub fn scale(self, factor: f64) -> Result<Self, SpecError> {
        self.apply(Directive::Scale(factor))
    }

    pub fn scale_xy(self, x: f64, y: f64) -> Result<Self, SpecError> {
        self.apply(Directive::ScaleXY(x, y))
    }

    pub fn keep_aspect_ratio(self, keep: bool) -> Result<Self, SpecError> {
        self.apply(Directive::KeepAspectRatio(keep))
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    pub fn source_region(self, position: Position, size: Size) -> Result<Self, SpecError> {
        self.apply(Directive::SourceRegion {
            position: Some(position),
            size: Some(size),
        })
    }

    /// Region by top-left corner and size.
    pub fn source_region_rect(self, x: i64, y: i64, width: u32, height: u32) -> Result<Self, SpecError> {
        self.source_region(Position::At(Coordinate::new(x, y)), Size::new(width, height))
    }

    pub fn crop(self, position: Position) -> Result<Self, SpecError> {
        self.apply(Directive::Crop(Some(position)))
    }

    pub fn watermark(
        self,
        position: Position,
        image: impl Into<Arc<DynamicImage>>,
        opacity: f32,
    ) -> Result<Self, SpecError> {
        self.watermark_inset(position, image, opacity, 0)
    }

    pub fn watermark_inset(
        self,
        position: Position,
        image: impl Into<Arc<DynamicImage>>,
        opacity: f32,
        inset: u32,
    ) -> Result<Self, SpecError> {
        self.apply(Directive::Watermark {
            position: Some(position),
            image: Some(image.into()),
            opacity,
            inset,
        })
    }

    // =========================================================================
    // Resize strategy and hints
    // =========================================================================

    pub fn resizer(self, resizer: Arc<dyn Resizer>) -> Result<Self, SpecError> {
        self.apply(Directive::Resizer(Some(resizer)))
    }

    pub fn resizer_factory(self, factory: Arc<dyn ResizerFactory>) -> Result<Self, SpecError> {
        self.apply(Directive::ResizerFactory(Some(factory)))
    }

    pub fn scaling_mode(self, mode: ScalingMode) -> Result<Self, SpecError> {
        self.apply(Directive::ScalingMode(Some(mode)))
    }

    pub fn alpha_interpolation(self, value: AlphaInterpolation) -> Result<Self, SpecError> {
        self.apply(Directive::AlphaInterpolation(Some(value)))
    }

    pub fn dithering(self, value: Dithering) -> Result<Self, SpecError> {
        self.apply(Directive::Dithering(Some(value)))
    }

    pub fn antialiasing(self, value: Antialiasing) -> Result<Self, SpecError> {
        self.apply(Directive::Antialiasing(Some(value)))
    }

    pub fn rendering(self, value: Rendering) -> Result<Self, SpecError> {
        self.apply(Directive::Rendering(Some(value)))
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// A format name or extension, or `"original"`.
    pub fn output_format(self, name: &str) -> Result<Self, SpecError> {
        self.apply(Directive::OutputFormat(Some(name.to_string())))
    }

    /// A compression scheme offered by the output format, or `"default"`.
    pub fn output_format_type(self, name: &str) -> Result<Self, SpecError> {
        self.apply(Directive::OutputFormatType(Some(name.to_string())))
    }

    pub fn output_quality(self, quality: f64) -> Result<Self, SpecError> {
        self.apply(Directive::OutputQuality(quality))
    }

    pub fn image_type(self, pixel_format: PixelFormat) -> Result<Self, SpecError> {
        self.apply(Directive::ImageType(Some(pixel_format)))
    }

    pub fn allow_overwrite(self, allow: bool) -> Result<Self, SpecError> {
        self.apply(Directive::AllowOverwrite(allow))
    }

    pub fn use_exif_orientation(self, enabled: bool) -> Result<Self, SpecError> {
        self.apply(Directive::UseExifOrientation(enabled))
    }

    // =========================================================================
    // Batch terminals
    // =========================================================================

    pub fn as_images(self) -> Result<Vec<Outcome<DynamicImage>>, SpecError> {
        self.run_batch(|_, source, spec, codec| render_image(source, spec, codec))
    }

    pub fn as_bytes_all(self) -> Result<Vec<Outcome<Encoded>>, SpecError> {
        self.run_batch(|_, source, spec, codec| encode_bytes(source, spec, codec))
    }

    /// Write input `i` to `destinations[i]`. Counts must match.
    pub fn to_files<P: Into<PathBuf>>(
        self,
        destinations: impl IntoIterator<Item = P>,
    ) -> Result<Vec<Outcome<PathBuf>>, SpecError> {
        let destinations: Vec<PathBuf> = destinations.into_iter().map(Into::into).collect();
        if destinations.len() != self.sources.len() {
            return Err(SpecError::InvalidArgument(format!(
                "{} destinations given for {} inputs",
                destinations.len(),
                self.sources.len()
            )));
        }
        self.run_batch(|index, source, spec, codec| {
            write_file(source, &destinations[index], spec, codec)
        })
    }

    /// Write every input into `dir`, named by `rename` applied to its file name.
    pub fn to_dir(self, dir: &Path, rename: &dyn Rename) -> Result<Vec<Outcome<PathBuf>>, SpecError> {
        self.run_batch(|_, source, spec, codec| {
            let name = source.file_name().ok_or(ThumbnailError::MissingSourceName)?;
            let destination = dir.join(rename.apply(&name, spec));
            write_file(source, &destination, spec, codec)
        })
    }

    /// Write each file input next to itself, named by `rename`. Inputs that
    /// are not files fail with `MissingSourceName`.
    pub fn as_files(self, rename: &dyn Rename) -> Result<Vec<Outcome<PathBuf>>, SpecError> {
        self.run_batch(|_, source, spec, codec| {
            let Source::Path(path) = &source else {
                return Err(ThumbnailError::MissingSourceName);
            };
            let name = source.file_name().ok_or(ThumbnailError::MissingSourceName)?;
            let destination = path.with_file_name(rename.apply(&name, spec));
            write_file(source, &destination, spec, codec)
        })
    }

    // =========================================================================
    // Single-input terminals
    // =========================================================================

    pub fn as_image(self) -> Result<DynamicImage, ThumbnailError> {
        self.run_single("as_image", |source, spec, codec| render_image(source, spec, codec))
    }

    pub fn as_bytes(self) -> Result<Encoded, ThumbnailError> {
        self.run_single("as_bytes", |source, spec, codec| encode_bytes(source, spec, codec))
    }

    /// Returns the path actually written, which gains the output format's
    /// extension if `path` has a different one.
    pub fn to_file(self, path: impl AsRef<Path>) -> Result<PathBuf, ThumbnailError> {
        let path = path.as_ref();
        self.run_single("to_file", |source, spec, codec| write_file(source, path, spec, codec))
    }

    fn run_batch<T, F>(self, job: F) -> Result<Vec<Outcome<T>>, SpecError>
    where
        T: Send,
        F: Fn(usize, Source, &ThumbnailSpec, &dyn ImageCodec) -> Result<T, ThumbnailError> + Sync,
    {
        let spec = self.builder.freeze()?;
        let codec = self.codec;
        debug!("Running {} inputs with {:?}", self.sources.len(), spec);

        let outcomes: Vec<Outcome<T>> = self
            .sources
            .into_par_iter()
            .enumerate()
            .map(|(index, source)| {
                let name = source.label(index);
                let result = job(index, source, &*spec, codec.as_ref());
                if let Err(e) = &result {
                    warn!("{name}: {e}");
                }
                Outcome { name, result }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!("Processed {} inputs, {} failed", outcomes.len(), failed);
        Ok(outcomes)
    }

    fn run_single<T, F>(self, terminal: &str, job: F) -> Result<T, ThumbnailError>
    where
        F: FnOnce(Source, &ThumbnailSpec, &dyn ImageCodec) -> Result<T, ThumbnailError>,
    {
        let spec = self.builder.freeze()?;
        let [source]: [Source; 1] = self.sources.try_into().map_err(|sources: Vec<Source>| {
            SpecError::InvalidArgument(format!(
                "{terminal} needs exactly one input, got {}",
                sources.len()
            ))
        })?;
        job(source, &*spec, self.codec.as_ref())
    }
}

fn render_image(
    source: Source,
    spec: &ThumbnailSpec,
    codec: &dyn ImageCodec,
) -> Result<DynamicImage, ThumbnailError> {
    let start = source.load(codec, spec)?;
    Ok(pipeline::render(start, spec)?.into_image())
}

fn encode_bytes(
    source: Source,
    spec: &ThumbnailSpec,
    codec: &dyn ImageCodec,
) -> Result<Encoded, ThumbnailError> {
    let rendered = pipeline::render(source.load(codec, spec)?, spec)?;
    let resolved = resolve_output(spec, rendered.native_format(), None)?;
    rendered.encode(spec, codec, &resolved.params)
}

fn write_file(
    source: Source,
    destination: &Path,
    spec: &ThumbnailSpec,
    codec: &dyn ImageCodec,
) -> Result<PathBuf, ThumbnailError> {
    let rendered = pipeline::render(source.load(codec, spec)?, spec)?;
    let resolved = resolve_output(spec, rendered.native_format(), Some(destination))?;
    let path = resolved
        .destination
        .unwrap_or_else(|| destination.to_path_buf());

    if !spec.allow_overwrite() && path.exists() {
        return Err(ThumbnailError::DestinationExists(path));
    }

    let encoded = rendered.encode(spec, codec, &resolved.params)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &encoded.bytes)?;
    debug!("Wrote {}", path.display());
    Ok(path)
}
