//! Recipe configuration module.
//!
//! A recipe is a TOML file describing one set of thumbnail directives plus
//! the batch settings the CLI needs. Every key maps onto one directive and
//! goes through the same [`SpecBuilder`](crate::builder::SpecBuilder)
//! guards as the fluent API, so a recipe can never describe a spec the
//! library would refuse.
//!
//! ## Recipe Options
//!
//! ```toml
//! # Exactly one sizing key
//! size = [320, 240]          # or width = 320 / height = 240 / bounds = [320, 240]
//!                            # or force_size = [320, 240] / scale = 0.5 / scale = [0.5, 0.25]
//! keep_aspect_ratio = true   # with size; width, height and bounds accept only `true`
//!
//! crop = "center"            # anchor name or { x = 10, y = 20 }
//!
//! [source_region]
//! position = "top-left"
//! width = 800
//! height = 600
//!
//! [[watermarks]]
//! image = "logo.png"         # relative to the recipe file
//! position = "bottom-right"
//! opacity = 0.5
//! inset = 8
//!
//! scaling_mode = "progressive-bilinear"
//! rendering = "quality"
//!
//! output_format = "jpeg"
//! output_quality = 0.85
//!
//! [output]
//! rename = "suffix-hyphen-thumbnail"
//! directory = "thumbs"
//!
//! [processing]
//! max_processes = 4          # omit for auto = CPU cores
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::builder::Directive;
use crate::geometry::{Position, Size};
use crate::imaging::{CodecError, ImageCodec};
use crate::naming::Renames;
use crate::spec::{
    AlphaInterpolation, Antialiasing, Dithering, PixelFormat, Rendering, ScalingMode, SpecError,
};
use crate::thumbnails::Thumbnails;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Recipe validation error: {0}")]
    Validation(String),
    #[error("Watermark {}: {source}", path.display())]
    Watermark { path: PathBuf, source: CodecError },
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// One thumbnail recipe loaded from TOML.
///
/// All keys are optional except that a runnable recipe needs exactly one
/// sizing key. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Recipe {
    pub size: Option<[u32; 2]>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bounds: Option<[u32; 2]>,
    pub force_size: Option<[u32; 2]>,
    pub scale: Option<ScaleSetting>,
    pub keep_aspect_ratio: Option<bool>,

    pub source_region: Option<RegionConfig>,
    pub crop: Option<Position>,
    pub watermarks: Vec<WatermarkConfig>,

    pub scaling_mode: Option<ScalingMode>,
    pub alpha_interpolation: Option<AlphaInterpolation>,
    pub dithering: Option<Dithering>,
    pub antialiasing: Option<Antialiasing>,
    pub rendering: Option<Rendering>,

    pub output_format: Option<String>,
    pub output_format_type: Option<String>,
    pub output_quality: Option<f64>,
    pub image_type: Option<PixelFormat>,
    pub allow_overwrite: Option<bool>,
    pub use_exif_orientation: Option<bool>,

    pub output: OutputConfig,
    pub processing: ProcessingConfig,
}

/// `scale = 0.5` or `scale = [0.5, 0.25]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScaleSetting {
    Uniform(f64),
    PerAxis([f64; 2]),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionConfig {
    pub position: Option<Position>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Image file, relative to the recipe's directory.
    pub image: Option<PathBuf>,
    pub position: Option<Position>,
    #[serde(default = "default_watermark_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub inset: u32,
}

fn default_watermark_opacity() -> f32 {
    0.5
}

/// Where and under which names the CLI writes thumbnails.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Defaults to a `-thumbnail` suffix so inputs are never replaced by
    /// accident.
    pub rename: Renames,
    /// Target directory. When absent, thumbnails are written next to their inputs.
    pub directory: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            rename: Renames::SuffixHyphenThumbnail,
            directory: None,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

impl Recipe {
    /// Recipe-level checks. Directive values are checked by the builder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizing = self.sizing_keys();
        if sizing.len() > 1 {
            return Err(ConfigError::Validation(format!(
                "only one sizing key may be set, found: {}",
                sizing.join(", ")
            )));
        }
        if let Some(keep) = self.keep_aspect_ratio {
            match sizing.first().copied() {
                None => {
                    return Err(ConfigError::Validation(
                        "keep_aspect_ratio needs a sizing key".into(),
                    ));
                }
                Some(key @ ("scale" | "force_size")) => {
                    return Err(ConfigError::Validation(format!(
                        "keep_aspect_ratio cannot be used with {key}"
                    )));
                }
                Some(key @ ("width" | "height" | "bounds")) if !keep => {
                    return Err(ConfigError::Validation(format!(
                        "keep_aspect_ratio = false cannot be used with {key}, which always keeps the aspect ratio"
                    )));
                }
                Some(_) => {}
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn sizing_keys(&self) -> Vec<&'static str> {
        [
            ("size", self.size.is_some()),
            ("width", self.width.is_some()),
            ("height", self.height.is_some()),
            ("bounds", self.bounds.is_some()),
            ("force_size", self.force_size.is_some()),
            ("scale", self.scale.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, set)| set.then_some(key))
        .collect()
    }

    /// Translate the recipe into directives, in an order the builder accepts.
    ///
    /// Watermark images are decoded with `codec`; relative paths are taken
    /// from `base_dir`.
    pub fn directives(
        &self,
        base_dir: &Path,
        codec: &dyn ImageCodec,
    ) -> Result<Vec<Directive>, ConfigError> {
        let mut directives = Vec::new();

        if let Some([width, height]) = self.size {
            directives.push(Directive::Size { width, height });
        }
        if let Some(width) = self.width {
            directives.push(Directive::Width(width));
        }
        if let Some(height) = self.height {
            directives.push(Directive::Height(height));
        }
        if let Some([width, height]) = self.bounds {
            directives.push(Directive::Bounds { width, height });
        }
        if let Some([width, height]) = self.force_size {
            directives.push(Directive::ForceSize { width, height });
        }
        match self.scale {
            Some(ScaleSetting::Uniform(factor)) => directives.push(Directive::Scale(factor)),
            Some(ScaleSetting::PerAxis([x, y])) => directives.push(Directive::ScaleXY(x, y)),
            None => {}
        }
        if let Some(keep) = self.keep_aspect_ratio {
            directives.push(Directive::KeepAspectRatio(keep));
        }

        if let Some(region) = &self.source_region {
            directives.push(Directive::SourceRegion {
                position: region.position,
                size: region.width.zip(region.height).map(Size::from),
            });
        }
        if let Some(position) = self.crop {
            directives.push(Directive::Crop(Some(position)));
        }
        for watermark in &self.watermarks {
            let image = match &watermark.image {
                Some(path) => Some(Arc::new(load_watermark(&base_dir.join(path), codec)?)),
                None => None,
            };
            directives.push(Directive::Watermark {
                position: watermark.position,
                image,
                opacity: watermark.opacity,
                inset: watermark.inset,
            });
        }

        if let Some(mode) = self.scaling_mode {
            directives.push(Directive::ScalingMode(Some(mode)));
        }
        if let Some(value) = self.alpha_interpolation {
            directives.push(Directive::AlphaInterpolation(Some(value)));
        }
        if let Some(value) = self.dithering {
            directives.push(Directive::Dithering(Some(value)));
        }
        if let Some(value) = self.antialiasing {
            directives.push(Directive::Antialiasing(Some(value)));
        }
        if let Some(value) = self.rendering {
            directives.push(Directive::Rendering(Some(value)));
        }

        if let Some(name) = &self.output_format {
            directives.push(Directive::OutputFormat(Some(name.clone())));
        }
        if let Some(name) = &self.output_format_type {
            directives.push(Directive::OutputFormatType(Some(name.clone())));
        }
        if let Some(quality) = self.output_quality {
            directives.push(Directive::OutputQuality(quality));
        }
        if let Some(pixel_format) = self.image_type {
            directives.push(Directive::ImageType(Some(pixel_format)));
        }
        if let Some(allow) = self.allow_overwrite {
            directives.push(Directive::AllowOverwrite(allow));
        }
        if let Some(enabled) = self.use_exif_orientation {
            directives.push(Directive::UseExifOrientation(enabled));
        }

        Ok(directives)
    }

    /// Feed the recipe's directives into a batch, using the batch's codec
    /// for watermark images.
    pub fn apply(&self, thumbnails: Thumbnails, base_dir: &Path) -> Result<Thumbnails, ConfigError> {
        let directives = self.directives(base_dir, thumbnails.codec())?;
        let mut thumbnails = thumbnails;
        for directive in directives {
            thumbnails = thumbnails.apply(directive)?;
        }
        Ok(thumbnails)
    }
}

fn load_watermark(path: &Path, codec: &dyn ImageCodec) -> Result<image::DynamicImage, ConfigError> {
    debug!("Loading watermark {}", path.display());
    let bytes = fs::read(path)?;
    let decoded = codec.decode(&bytes).map_err(|source| ConfigError::Watermark {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.orientation.normalize(decoded.image))
}

pub fn parse_recipe(content: &str) -> Result<Recipe, ConfigError> {
    let recipe: Recipe = toml::from_str(content)?;
    recipe.validate()?;
    Ok(recipe)
}

/// Load and validate a recipe file.
pub fn load_recipe(path: &Path) -> Result<Recipe, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_recipe(&content)
}

/// Returns a fully-commented stock recipe with all keys and explanations.
///
/// Used by the `gen-recipe` CLI command.
pub fn stock_recipe_toml() -> &'static str {
    r##"# Thumbwright Recipe
# ==================
# Describes how every input of a run is turned into a thumbnail.
# Uncomment what you need. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Sizing (exactly one of these)
# ---------------------------------------------------------------------------
# Fit inside a box. Keeps the aspect ratio unless keep_aspect_ratio = false.
size = [160, 160]
# width = 160                 # fixed width, height follows the aspect ratio
# height = 160                # fixed height, width follows the aspect ratio
# bounds = [160, 160]         # fit inside, always keeping the aspect ratio
# force_size = [160, 160]     # exact size, distorting if needed
# scale = 0.25                # uniform factor, or [x, y] per axis

# Only valid with `size`.
# keep_aspect_ratio = true

# ---------------------------------------------------------------------------
# Geometry
# ---------------------------------------------------------------------------
# Fill the size box and cut the overflow, keeping this part of the image.
# Anchors: top-left, top-center, top-right, center-left, center,
# center-right, bottom-left, bottom-center, bottom-right, or { x = 0, y = 0 }.
# crop = "center"

# Use only part of each source image.
# [source_region]
# position = "center"
# width = 800
# height = 600

# Stamp images onto the thumbnail. Paths are relative to this file.
# [[watermarks]]
# image = "logo.png"
# position = "bottom-right"
# opacity = 0.5               # 0.0 (invisible) to 1.0 (opaque)
# inset = 0                   # margin from the anchored edges, in pixels

# ---------------------------------------------------------------------------
# Resampling
# ---------------------------------------------------------------------------
# bilinear, bicubic or progressive-bilinear. Omit to pick per image.
# scaling_mode = "progressive-bilinear"

# Hints: alpha_interpolation (default/speed/quality), dithering
# (default/enable/disable), antialiasing (default/on/off),
# rendering (default/speed/quality).
# rendering = "quality"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
# jpeg, png, webp, gif, bmp, tiff, avif or "original" (same as the input).
# output_format = "jpeg"

# Compression scheme; png offers "fast" and "best", webp offers "lossless".
# output_format_type = "default"

# Encoder quality between 0.0 and 1.0, for formats that take one.
# output_quality = 0.8

# Pixel layout before encoding: luma8, lumaa8, rgb8, rgba8, rgb16, rgba16.
# image_type = "rgb8"

# Replace existing files (default true).
# allow_overwrite = true

# Rotate according to the EXIF orientation tag (default true).
# use_exif_orientation = true

[output]
# no-change, prefix-dot-thumbnail, prefix-hyphen-thumbnail,
# suffix-dot-thumbnail or suffix-hyphen-thumbnail (the default).
# no-change writes over the inputs themselves.
rename = "suffix-hyphen-thumbnail"
# Write here instead of next to each input.
# directory = "thumbnails"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers. Omit to use all CPU cores.
# Values above the core count are clamped down.
# max_processes = 4
"##
}
