//! Directive validation: the state machine that turns configuration calls
//! into a [`ThumbnailSpec`].
//!
//! Every configuration call is a [`Directive`] applied with
//! [`SpecBuilder::apply`]. Each directive is a guarded transition: a guard
//! that does not hold fails immediately and leaves the builder unchanged.
//! Guards run in a fixed order:
//!
//! 1. missing references → [`SpecError::NullArgument`]
//! 2. conflicts with earlier directives → [`SpecError::InvalidState`]
//! 3. out-of-domain values → [`SpecError::InvalidArgument`]
//!
//! ## Conflict rules
//!
//! | Directive | Conflicts with |
//! |---|---|
//! | `size`, `width`, `height`, `bounds`, `force_size`, `scale`, `scale_xy` | any other sizing directive |
//! | `keep_aspect_ratio` | no sizing yet, scale or forced sizing, a second call; `false` after `width`/`height`/`bounds` |
//! | `crop` | a second crop, scale sizing (either order) |
//! | `resizer`, `resizer_factory`, `scaling_mode` | each other, or themselves |
//! | `resizer_factory` | any rendering hint (either order) |
//! | rendering hints, `output_quality`, `output_format`, `output_format_type`, `image_type`, `allow_overwrite`, `use_exif_orientation`, `source_region` | a second call |
//!
//! `output_format_type` additionally needs a committed `output_format` whose
//! codec offers the requested scheme.

use crate::geometry::{Position, Region, Size};
use crate::imaging::resizer::{Resizer, ResizerFactory};
use crate::spec::{
    AlphaInterpolation, Antialiasing, AspectPolicy, Dithering, FormatType, OutputFormat,
    PixelFormat, Rendering, ResizeStrategy, ScalingMode, SizingMode, SpecError, ThumbnailSpec,
    Watermark,
};
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;

/// One configuration call.
///
/// Variants carrying a reference take an `Option` so that an absent value
/// can be reported as [`SpecError::NullArgument`] rather than being
/// unrepresentable; recipes and foreign callers produce `None` when an
/// input is missing.
#[derive(Clone)]
pub enum Directive {
    /// Fit inside `width x height`; keeps the aspect ratio unless told otherwise.
    Size { width: u32, height: u32 },
    Width(u32),
    Height(u32),
    /// Fit inside a box; the aspect ratio is always kept.
    Bounds { width: u32, height: u32 },
    /// Exactly `width x height`, distorting if needed.
    ForceSize { width: u32, height: u32 },
    Scale(f64),
    ScaleXY(f64, f64),
    KeepAspectRatio(bool),
    SourceRegion {
        position: Option<Position>,
        size: Option<Size>,
    },
    Crop(Option<Position>),
    Watermark {
        position: Option<Position>,
        image: Option<Arc<DynamicImage>>,
        opacity: f32,
        inset: u32,
    },
    Resizer(Option<Arc<dyn Resizer>>),
    ResizerFactory(Option<Arc<dyn ResizerFactory>>),
    ScalingMode(Option<ScalingMode>),
    AlphaInterpolation(Option<AlphaInterpolation>),
    Dithering(Option<Dithering>),
    Antialiasing(Option<Antialiasing>),
    Rendering(Option<Rendering>),
    OutputFormat(Option<String>),
    OutputFormatType(Option<String>),
    OutputQuality(f64),
    ImageType(Option<PixelFormat>),
    AllowOverwrite(bool),
    UseExifOrientation(bool),
}

impl Directive {
    /// Name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Size { .. } => "size",
            Directive::Width(_) => "width",
            Directive::Height(_) => "height",
            Directive::Bounds { .. } => "bounds",
            Directive::ForceSize { .. } => "force_size",
            Directive::Scale(_) => "scale",
            Directive::ScaleXY(..) => "scale_xy",
            Directive::KeepAspectRatio(_) => "keep_aspect_ratio",
            Directive::SourceRegion { .. } => "source_region",
            Directive::Crop(_) => "crop",
            Directive::Watermark { .. } => "watermark",
            Directive::Resizer(_) => "resizer",
            Directive::ResizerFactory(_) => "resizer_factory",
            Directive::ScalingMode(_) => "scaling_mode",
            Directive::AlphaInterpolation(_) => "alpha_interpolation",
            Directive::Dithering(_) => "dithering",
            Directive::Antialiasing(_) => "antialiasing",
            Directive::Rendering(_) => "rendering",
            Directive::OutputFormat(_) => "output_format",
            Directive::OutputFormatType(_) => "output_format_type",
            Directive::OutputQuality(_) => "output_quality",
            Directive::ImageType(_) => "image_type",
            Directive::AllowOverwrite(_) => "allow_overwrite",
            Directive::UseExifOrientation(_) => "use_exif_orientation",
        }
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accumulates directives; [`freeze`](Self::freeze) hands out the result.
#[derive(Debug, Clone, Default)]
pub struct SpecBuilder {
    spec: ThumbnailSpec,
    /// Set by an explicit `keep_aspect_ratio`, as opposed to a sizing default.
    aspect_locked: bool,
}

fn conflict(directive: &str, earlier: &str) -> SpecError {
    SpecError::InvalidState(format!("{directive} cannot be combined with {earlier}"))
}

fn repeated(directive: &str) -> SpecError {
    SpecError::InvalidState(format!("{directive} has already been set"))
}

fn set_once<T>(slot: &mut Option<T>, directive: &str, value: T) -> Result<(), SpecError> {
    if slot.is_some() {
        return Err(repeated(directive));
    }
    *slot = Some(value);
    Ok(())
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, SpecError> {
    value.ok_or(SpecError::NullArgument(field))
}

impl SpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The spec as configured so far.
    pub fn spec(&self) -> &ThumbnailSpec {
        &self.spec
    }

    /// Validate and record one directive.
    pub fn apply(&mut self, directive: Directive) -> Result<(), SpecError> {
        match directive {
            Directive::Size { width, height } => {
                self.commit_box(SizingMode::ExplicitSize { width, height }, width, height)
            }
            Directive::Width(width) => self.commit_box(SizingMode::WidthOnly(width), width, 1),
            Directive::Height(height) => self.commit_box(SizingMode::HeightOnly(height), 1, height),
            Directive::Bounds { width, height } => {
                self.commit_box(SizingMode::WidthAndHeight { width, height }, width, height)
            }
            Directive::ForceSize { width, height } => {
                self.commit_box(SizingMode::ForceSize { width, height }, width, height)
            }
            Directive::Scale(factor) => self.commit_scale(SizingMode::Scale(factor), &[factor]),
            Directive::ScaleXY(x, y) => self.commit_scale(SizingMode::ScaleXY(x, y), &[x, y]),
            Directive::KeepAspectRatio(keep) => self.keep_aspect_ratio(keep),
            Directive::SourceRegion { position, size } => {
                let position = required(position, "source region position")?;
                let size = required(size, "source region size")?;
                if self.spec.source_region.is_some() {
                    return Err(repeated("source_region"));
                }
                if size.is_empty() {
                    return Err(SpecError::InvalidArgument(format!(
                        "source region must have a positive size, got {size}"
                    )));
                }
                self.spec.source_region = Some(Region::new(position, size));
                Ok(())
            }
            Directive::Crop(position) => {
                let position = required(position, "crop position")?;
                if self.spec.crop.is_some() {
                    return Err(repeated("crop"));
                }
                if self.spec.sizing.is_scale() {
                    return Err(conflict("crop", self.spec.sizing.directive_name()));
                }
                self.spec.crop = Some(position);
                Ok(())
            }
            Directive::Watermark {
                position,
                image,
                opacity,
                inset,
            } => {
                let position = required(position, "watermark position")?;
                let image = required(image, "watermark image")?;
                if !(0.0..=1.0).contains(&opacity) {
                    return Err(SpecError::InvalidArgument(format!(
                        "watermark opacity must be between 0.0 and 1.0, got {opacity}"
                    )));
                }
                self.spec.watermarks.push(Watermark {
                    position,
                    image,
                    opacity,
                    inset,
                });
                Ok(())
            }
            Directive::Resizer(resizer) => {
                let resizer = required(resizer, "resizer")?;
                self.commit_strategy("resizer", ResizeStrategy::Explicit(resizer))
            }
            Directive::ResizerFactory(factory) => {
                let factory = required(factory, "resizer factory")?;
                if !self.spec.hints.is_empty() {
                    return Err(conflict("resizer_factory", "rendering hints"));
                }
                self.commit_strategy("resizer_factory", ResizeStrategy::Factory(factory))
            }
            Directive::ScalingMode(mode) => {
                let mode = required(mode, "scaling mode")?;
                self.commit_strategy("scaling_mode", ResizeStrategy::ScalingMode(mode))
            }
            Directive::AlphaInterpolation(value) => {
                let value = required(value, "alpha interpolation")?;
                self.check_hint_allowed("alpha_interpolation")?;
                set_once(&mut self.spec.hints.alpha_interpolation, "alpha_interpolation", value)
            }
            Directive::Dithering(value) => {
                let value = required(value, "dithering")?;
                self.check_hint_allowed("dithering")?;
                set_once(&mut self.spec.hints.dithering, "dithering", value)
            }
            Directive::Antialiasing(value) => {
                let value = required(value, "antialiasing")?;
                self.check_hint_allowed("antialiasing")?;
                set_once(&mut self.spec.hints.antialiasing, "antialiasing", value)
            }
            Directive::Rendering(value) => {
                let value = required(value, "rendering")?;
                self.check_hint_allowed("rendering")?;
                set_once(&mut self.spec.hints.rendering, "rendering", value)
            }
            Directive::OutputFormat(name) => {
                let name = required(name, "output format")?;
                if self.spec.output_format.is_some() {
                    return Err(repeated("output_format"));
                }
                let format = OutputFormat::parse(&name).ok_or_else(|| {
                    SpecError::InvalidArgument(format!("unsupported output format: {name}"))
                })?;
                self.spec.output_format = Some(format);
                Ok(())
            }
            Directive::OutputFormatType(name) => {
                let name = required(name, "output format type")?;
                if self.spec.output_format_type.is_some() {
                    return Err(repeated("output_format_type"));
                }
                let format_type = self.validate_format_type(&name)?;
                self.spec.output_format_type = Some(format_type);
                Ok(())
            }
            Directive::OutputQuality(quality) => {
                if self.spec.output_quality.is_some() {
                    return Err(repeated("output_quality"));
                }
                if !(0.0..=1.0).contains(&quality) {
                    return Err(SpecError::InvalidArgument(format!(
                        "output quality must be between 0.0 and 1.0, got {quality}"
                    )));
                }
                self.spec.output_quality = Some(quality);
                Ok(())
            }
            Directive::ImageType(pixel_format) => {
                let pixel_format = required(pixel_format, "image type")?;
                set_once(&mut self.spec.image_type, "image_type", pixel_format)
            }
            Directive::AllowOverwrite(allow) => {
                set_once(&mut self.spec.allow_overwrite, "allow_overwrite", allow)
            }
            Directive::UseExifOrientation(enabled) => {
                set_once(&mut self.spec.use_exif_orientation, "use_exif_orientation", enabled)
            }
        }
    }

    /// Snapshot the configuration for a run. Requires a sizing directive.
    pub fn freeze(&self) -> Result<Arc<ThumbnailSpec>, SpecError> {
        if !self.spec.sizing.is_set() {
            return Err(SpecError::InvalidState(
                "no sizing directive (size, width, height, bounds, scale or force_size) has been set"
                    .into(),
            ));
        }
        Ok(Arc::new(self.spec.clone()))
    }

    fn check_sizing_free(&self, mode: &SizingMode) -> Result<(), SpecError> {
        if self.spec.sizing.is_set() {
            return Err(conflict(mode.directive_name(), self.spec.sizing.directive_name()));
        }
        Ok(())
    }

    fn commit_box(&mut self, mode: SizingMode, width: u32, height: u32) -> Result<(), SpecError> {
        self.check_sizing_free(&mode)?;
        if width == 0 || height == 0 {
            return Err(SpecError::InvalidArgument(format!(
                "{} dimensions must be positive",
                mode.directive_name()
            )));
        }
        self.spec.aspect = match mode {
            SizingMode::ForceSize { .. } => AspectPolicy::Ignore,
            _ => AspectPolicy::Preserve,
        };
        self.spec.sizing = mode;
        Ok(())
    }

    fn commit_scale(&mut self, mode: SizingMode, factors: &[f64]) -> Result<(), SpecError> {
        self.check_sizing_free(&mode)?;
        if self.spec.crop.is_some() {
            return Err(conflict(mode.directive_name(), "crop"));
        }
        for (axis, factor) in ["x", "y"].iter().zip(factors) {
            if !(*factor > 0.0 && factor.is_finite()) {
                return Err(SpecError::InvalidArgument(format!(
                    "{} factor ({axis}) must be finite and positive, got {factor}",
                    mode.directive_name()
                )));
            }
        }
        self.spec.sizing = mode;
        Ok(())
    }

    fn keep_aspect_ratio(&mut self, keep: bool) -> Result<(), SpecError> {
        let sizing = self.spec.sizing;
        if !sizing.is_set() {
            return Err(SpecError::InvalidState(
                "keep_aspect_ratio requires a size to be set first".into(),
            ));
        }
        if sizing.is_scale() || matches!(sizing, SizingMode::ForceSize { .. }) {
            return Err(conflict("keep_aspect_ratio", sizing.directive_name()));
        }
        if self.aspect_locked {
            return Err(repeated("keep_aspect_ratio"));
        }
        if sizing.is_shortcut() && !keep {
            return Err(SpecError::InvalidState(format!(
                "keep_aspect_ratio(false) cannot be used with {}",
                sizing.directive_name()
            )));
        }
        self.spec.aspect = if keep {
            AspectPolicy::Preserve
        } else {
            AspectPolicy::Ignore
        };
        self.aspect_locked = true;
        Ok(())
    }

    fn commit_strategy(&mut self, directive: &str, strategy: ResizeStrategy) -> Result<(), SpecError> {
        let earlier = match self.spec.resize_strategy {
            ResizeStrategy::Default => None,
            ResizeStrategy::Explicit(_) => Some("resizer"),
            ResizeStrategy::Factory(_) => Some("resizer_factory"),
            ResizeStrategy::ScalingMode(_) => Some("scaling_mode"),
        };
        match earlier {
            Some(earlier) if earlier == directive => Err(repeated(directive)),
            Some(earlier) => Err(conflict(directive, earlier)),
            None => {
                self.spec.resize_strategy = strategy;
                Ok(())
            }
        }
    }

    fn check_hint_allowed(&self, directive: &str) -> Result<(), SpecError> {
        if matches!(self.spec.resize_strategy, ResizeStrategy::Factory(_)) {
            return Err(conflict(directive, "resizer_factory"));
        }
        Ok(())
    }

    fn validate_format_type(&self, name: &str) -> Result<FormatType, SpecError> {
        let format_type = FormatType::parse(name);
        let Some(output_format) = self.spec.output_format else {
            return Err(SpecError::InvalidArgument(
                "output_format_type requires output_format to be set first".into(),
            ));
        };
        let FormatType::Scheme(scheme) = &format_type else {
            return Ok(format_type);
        };
        match output_format {
            OutputFormat::Original => Err(SpecError::InvalidArgument(format!(
                "format type {scheme} cannot be used with the original format"
            ))),
            OutputFormat::Named(format) if format.format_types().is_empty() => {
                Err(SpecError::InvalidArgument(format!(
                    "{format} does not support format types"
                )))
            }
            OutputFormat::Named(format) if !format.format_types().contains(&scheme.as_str()) => {
                Err(SpecError::InvalidArgument(format!(
                    "{format} does not support format type {scheme}; supported: {}",
                    format.format_types().join(", ")
                )))
            }
            OutputFormat::Named(_) => Ok(format_type),
        }
    }
}
