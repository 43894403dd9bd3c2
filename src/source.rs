//! Thumbnail inputs and input discovery.
//!
//! An input is a decoded image, an encoded byte buffer or a file path. Each
//! carries an optional name, used in batch reports and to derive output
//! file names.

use crate::imaging::format::supported_input_extensions;
use crate::imaging::{Decoded, ImageCodec};
use crate::pipeline::{Stage, ThumbnailError, stage};
use crate::spec::ThumbnailSpec;
use image::DynamicImage;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub enum Source {
    Image {
        name: Option<String>,
        image: DynamicImage,
    },
    Bytes {
        name: Option<String>,
        bytes: Vec<u8>,
    },
    Path(PathBuf),
}

impl Source {
    pub fn image(image: DynamicImage) -> Self {
        Source::Image { name: None, image }
    }

    pub fn bytes(bytes: Vec<u8>) -> Self {
        Source::Bytes { name: None, bytes }
    }

    pub fn named_image(name: impl Into<String>, image: DynamicImage) -> Self {
        Source::Image {
            name: Some(name.into()),
            image,
        }
    }

    pub fn named_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Source::Bytes {
            name: Some(name.into()),
            bytes,
        }
    }

    /// File name for output naming, if the input has one.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Source::Image { name, .. } | Source::Bytes { name, .. } => name.clone(),
            Source::Path(path) => path
                .file_name()
                .and_then(OsStr::to_str)
                .map(str::to_string),
        }
    }

    /// Label for reports: the name, the path, or the position in the batch.
    pub fn label(&self, index: usize) -> String {
        match self {
            Source::Path(path) => path.display().to_string(),
            _ => self
                .file_name()
                .unwrap_or_else(|| format!("input #{}", index + 1)),
        }
    }

    /// Decode (if needed) into the first pipeline stage.
    pub fn load(
        self,
        codec: &dyn ImageCodec,
        spec: &ThumbnailSpec,
    ) -> Result<Stage<stage::Decoded>, ThumbnailError> {
        let decoded: Decoded = match self {
            Source::Image { image, .. } => return Ok(Stage::from_image(image)),
            Source::Bytes { bytes, .. } => codec.decode(&bytes)?,
            Source::Path(path) => {
                debug!("Reading {}", path.display());
                let bytes = std::fs::read(&path)?;
                codec.decode(&bytes)?
            }
        };
        Ok(Stage::decoded(decoded, spec))
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

impl From<DynamicImage> for Source {
    fn from(image: DynamicImage) -> Self {
        Source::image(image)
    }
}

fn has_supported_extension(path: &Path) -> bool {
    let extensions = supported_input_extensions();
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Expand input arguments into image files.
///
/// Files are taken as given, whatever their extension, so unreadable ones
/// show up as failed inputs. Directories are walked recursively and only
/// files with a decodable extension are kept, sorted by path.
pub fn collect_inputs(paths: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_file() {
            inputs.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input not found: {}", path.display()),
            ));
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| has_supported_extension(path))
            .collect();
        found.sort();
        debug!("Found {} images under {}", found.len(), path.display());
        inputs.extend(found);
    }
    Ok(inputs)
}
