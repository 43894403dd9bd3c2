//! The frozen thumbnail settings and their building blocks.
//!
//! A [`ThumbnailSpec`] is produced by [`SpecBuilder`](crate::builder::SpecBuilder)
//! and never changes afterwards. Batches share it behind an `Arc`, so every
//! field is either `Copy` or reference-counted.
//!
//! ## Types
//!
//! - [`SizingMode`]: the mutually exclusive sizing family (size, width, height,
//!   bounds, scale, scale per axis, forced size).
//! - [`AspectPolicy`]: whether explicit sizes keep the source aspect ratio.
//! - [`ResizeStrategy`]: who picks the resampling algorithm.
//! - [`RenderingHints`]: quality/speed hints consulted by the built-in resizers.
//! - [`Watermark`]: an image composited at an anchor with opacity and inset.
//! - [`OutputFormat`], [`FormatType`], [`PixelFormat`]: encode-time overrides.

use crate::geometry::{Position, Region, Size, UNBOUNDED};
use crate::imaging::format::Format;
use crate::imaging::resizer::{Resizer, ResizerFactory};
use crate::sizing::FitMode;
use image::DynamicImage;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Sentinel output format name: keep the source's own format.
pub const ORIGINAL_FORMAT: &str = "original";

/// Sentinel format type name: let the codec pick its default scheme.
pub const DEFAULT_FORMAT_TYPE: &str = "default";

/// Configuration errors. Raised by the directive that caused them, except
/// region bounds which are only known once the source is decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Missing argument: {0}")]
    NullArgument(&'static str),
}

/// How target dimensions are derived from the source.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SizingMode {
    #[default]
    Unset,
    ExplicitSize { width: u32, height: u32 },
    WidthOnly(u32),
    HeightOnly(u32),
    /// Fit inside a box; always keeps the aspect ratio.
    WidthAndHeight { width: u32, height: u32 },
    Scale(f64),
    ScaleXY(f64, f64),
    ForceSize { width: u32, height: u32 },
}

impl SizingMode {
    pub fn is_set(&self) -> bool {
        !matches!(self, SizingMode::Unset)
    }

    pub fn is_scale(&self) -> bool {
        matches!(self, SizingMode::Scale(_) | SizingMode::ScaleXY(..))
    }

    /// Width/height shortcuts: sized by one axis or a bounding box, never distorted.
    pub fn is_shortcut(&self) -> bool {
        matches!(
            self,
            SizingMode::WidthOnly(_) | SizingMode::HeightOnly(_) | SizingMode::WidthAndHeight { .. }
        )
    }

    /// Name of the directive that committed this mode, for error messages.
    pub fn directive_name(&self) -> &'static str {
        match self {
            SizingMode::Unset => "nothing",
            SizingMode::ExplicitSize { .. } => "size",
            SizingMode::WidthOnly(_) => "width",
            SizingMode::HeightOnly(_) => "height",
            SizingMode::WidthAndHeight { .. } => "bounds",
            SizingMode::Scale(_) => "scale",
            SizingMode::ScaleXY(..) => "scale_xy",
            SizingMode::ForceSize { .. } => "force_size",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectPolicy {
    #[default]
    Unset,
    Preserve,
    Ignore,
}

/// Built-in resampling families selectable without supplying a resizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalingMode {
    Bilinear,
    Bicubic,
    ProgressiveBilinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlphaInterpolation {
    Default,
    Speed,
    Quality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dithering {
    Default,
    Enable,
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Antialiasing {
    Default,
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rendering {
    Default,
    Speed,
    Quality,
}

/// Independent resampling hints. Unset hints behave like `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderingHints {
    pub alpha_interpolation: Option<AlphaInterpolation>,
    pub dithering: Option<Dithering>,
    pub antialiasing: Option<Antialiasing>,
    pub rendering: Option<Rendering>,
}

impl RenderingHints {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Default)]
pub enum ResizeStrategy {
    #[default]
    Default,
    Explicit(Arc<dyn Resizer>),
    Factory(Arc<dyn ResizerFactory>),
    ScalingMode(ScalingMode),
}

impl fmt::Debug for ResizeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResizeStrategy::Default => f.write_str("Default"),
            ResizeStrategy::Explicit(_) => f.write_str("Explicit(..)"),
            ResizeStrategy::Factory(_) => f.write_str("Factory(..)"),
            ResizeStrategy::ScalingMode(mode) => write!(f, "ScalingMode({mode:?})"),
        }
    }
}

/// An image stamped onto the thumbnail after resizing and cropping.
#[derive(Clone)]
pub struct Watermark {
    pub position: Position,
    pub image: Arc<DynamicImage>,
    /// 0.0 (invisible) to 1.0 (opaque).
    pub opacity: f32,
    /// Margin from the edges the anchor touches, in pixels.
    pub inset: u32,
}

impl fmt::Debug for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watermark")
            .field("position", &self.position)
            .field("image", &format_args!("{}x{}", self.image.width(), self.image.height()))
            .field("opacity", &self.opacity)
            .field("inset", &self.inset)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Same as leaving the format unset, but unlocks `output_format_type(DEFAULT_FORMAT_TYPE)`.
    Original,
    Named(Format),
}

impl OutputFormat {
    pub fn parse(name: &str) -> Option<Self> {
        if name.trim().eq_ignore_ascii_case(ORIGINAL_FORMAT) {
            return Some(OutputFormat::Original);
        }
        Format::from_name(name).map(OutputFormat::Named)
    }
}

/// Compression scheme requested from the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatType {
    Default,
    Scheme(String),
}

impl FormatType {
    pub fn parse(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        if name == DEFAULT_FORMAT_TYPE {
            FormatType::Default
        } else {
            FormatType::Scheme(name)
        }
    }
}

/// Pixel layout forced onto the thumbnail right before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Luma8,
    LumaA8,
    Rgb8,
    Rgba8,
    Rgb16,
    Rgba16,
}

impl PixelFormat {
    pub fn convert(self, image: DynamicImage) -> DynamicImage {
        match self {
            PixelFormat::Luma8 => DynamicImage::ImageLuma8(image.into_luma8()),
            PixelFormat::LumaA8 => DynamicImage::ImageLumaA8(image.into_luma_alpha8()),
            PixelFormat::Rgb8 => DynamicImage::ImageRgb8(image.into_rgb8()),
            PixelFormat::Rgba8 => DynamicImage::ImageRgba8(image.into_rgba8()),
            PixelFormat::Rgb16 => DynamicImage::ImageRgb16(image.into_rgb16()),
            PixelFormat::Rgba16 => DynamicImage::ImageRgba16(image.into_rgba16()),
        }
    }
}

/// Everything the pipeline needs to turn one source into one thumbnail.
///
/// Fields are crate-private so a spec can only come out of the builder,
/// already validated.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailSpec {
    pub(crate) sizing: SizingMode,
    pub(crate) aspect: AspectPolicy,
    pub(crate) source_region: Option<Region>,
    pub(crate) crop: Option<Position>,
    pub(crate) watermarks: Vec<Watermark>,
    pub(crate) resize_strategy: ResizeStrategy,
    pub(crate) hints: RenderingHints,
    pub(crate) output_format: Option<OutputFormat>,
    pub(crate) output_format_type: Option<FormatType>,
    pub(crate) output_quality: Option<f64>,
    pub(crate) image_type: Option<PixelFormat>,
    pub(crate) allow_overwrite: Option<bool>,
    pub(crate) use_exif_orientation: Option<bool>,
}

impl ThumbnailSpec {
    pub fn sizing(&self) -> SizingMode {
        self.sizing
    }

    pub fn aspect(&self) -> AspectPolicy {
        self.aspect
    }

    pub fn source_region(&self) -> Option<Region> {
        self.source_region
    }

    pub fn crop(&self) -> Option<Position> {
        self.crop
    }

    pub fn watermarks(&self) -> &[Watermark] {
        &self.watermarks
    }

    pub fn resize_strategy(&self) -> &ResizeStrategy {
        &self.resize_strategy
    }

    pub fn hints(&self) -> RenderingHints {
        self.hints
    }

    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output_format
    }

    pub fn output_format_type(&self) -> Option<&FormatType> {
        self.output_format_type.as_ref()
    }

    pub fn output_quality(&self) -> Option<f64> {
        self.output_quality
    }

    pub fn image_type(&self) -> Option<PixelFormat> {
        self.image_type
    }

    /// Existing destination files are replaced unless disabled.
    pub fn allow_overwrite(&self) -> bool {
        self.allow_overwrite.unwrap_or(true)
    }

    pub fn use_exif_orientation(&self) -> bool {
        self.use_exif_orientation.unwrap_or(true)
    }

    /// Cover fit when a crop follows the resize, so the crop window always
    /// fits; width/height-only sizing is single-axis and stays contain.
    pub fn fit_mode(&self) -> FitMode {
        let single_axis = matches!(
            self.sizing,
            SizingMode::WidthOnly(_) | SizingMode::HeightOnly(_)
        );
        if self.crop.is_some() && !single_axis {
            FitMode::Cover
        } else {
            FitMode::Contain
        }
    }

    /// The box the caller asked for, before aspect-ratio fitting. `None`
    /// for scale modes, which have no box.
    pub fn requested_box(&self) -> Option<Size> {
        match self.sizing {
            SizingMode::ExplicitSize { width, height }
            | SizingMode::WidthAndHeight { width, height }
            | SizingMode::ForceSize { width, height } => Some(Size::new(width, height)),
            SizingMode::WidthOnly(width) => Some(Size::new(width, UNBOUNDED)),
            SizingMode::HeightOnly(height) => Some(Size::new(UNBOUNDED, height)),
            SizingMode::Unset | SizingMode::Scale(_) | SizingMode::ScaleXY(..) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_mode_is_cover_only_with_crop_and_box_sizing() {
        let mut spec = ThumbnailSpec {
            sizing: SizingMode::ExplicitSize { width: 100, height: 50 },
            ..ThumbnailSpec::default()
        };
        assert_eq!(spec.fit_mode(), FitMode::Contain);

        spec.crop = Some(Position::Center);
        assert_eq!(spec.fit_mode(), FitMode::Cover);

        spec.sizing = SizingMode::WidthOnly(100);
        assert_eq!(spec.fit_mode(), FitMode::Contain);

        spec.sizing = SizingMode::WidthAndHeight { width: 10, height: 10 };
        assert_eq!(spec.fit_mode(), FitMode::Cover);
    }

    #[test]
    fn requested_box_marks_missing_axis_unbounded() {
        let spec = ThumbnailSpec {
            sizing: SizingMode::HeightOnly(40),
            ..ThumbnailSpec::default()
        };
        assert_eq!(spec.requested_box(), Some(Size::new(UNBOUNDED, 40)));

        let spec = ThumbnailSpec {
            sizing: SizingMode::Scale(0.5),
            ..ThumbnailSpec::default()
        };
        assert_eq!(spec.requested_box(), None);
    }

    #[test]
    fn defaults_allow_overwrite_and_exif() {
        let spec = ThumbnailSpec::default();
        assert!(spec.allow_overwrite());
        assert!(spec.use_exif_orientation());
    }

    #[test]
    fn output_format_parses_original_sentinel() {
        assert_eq!(OutputFormat::parse("ORIGINAL"), Some(OutputFormat::Original));
        assert_eq!(OutputFormat::parse("jpg"), Some(OutputFormat::Named(Format::Jpeg)));
        assert_eq!(OutputFormat::parse("xcf"), None);
    }

    #[test]
    fn format_type_parses_default_sentinel() {
        assert_eq!(FormatType::parse(" Default "), FormatType::Default);
        assert_eq!(FormatType::parse("BEST"), FormatType::Scheme("best".into()));
    }

    #[test]
    fn pixel_format_converts_color_type() {
        let rgb = DynamicImage::new_rgb8(4, 4);
        let gray = PixelFormat::Luma8.convert(rgb);
        assert_eq!(gray.color(), image::ColorType::L8);
    }
}
