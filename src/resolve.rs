//! Output resolution: which format to encode, with which settings, under
//! which file name.
//!
//! Everything here is a pure function of the spec, the source's native
//! format and the requested destination, so resolving twice always gives
//! the same answer.
//!
//! ## Format precedence
//!
//! 1. an explicit `output_format` (the `original` sentinel counts as unset)
//! 2. the format the source was decoded from
//! 3. the destination's extension, for file outputs
//!
//! If none applies the input fails with `UnsupportedFormat`.

use crate::imaging::{CodecError, EncodeParams, Format, Quality};
use crate::spec::{FormatType, OutputFormat, ThumbnailSpec};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Encoder settings plus, for file outputs, the final path.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub params: EncodeParams,
    pub destination: Option<PathBuf>,
}

pub fn resolve_format(
    spec: &ThumbnailSpec,
    native: Option<Format>,
    destination: Option<&Path>,
) -> Result<Format, CodecError> {
    if let Some(OutputFormat::Named(format)) = spec.output_format() {
        return Ok(format);
    }
    native
        .or_else(|| destination.and_then(Format::from_path))
        .ok_or_else(|| {
            CodecError::UnsupportedFormat(
                "no output format set and none can be inferred from the source or destination"
                    .into(),
            )
        })
}

/// Quality and format type are only passed on when the format takes them.
pub fn resolve_params(spec: &ThumbnailSpec, format: Format) -> EncodeParams {
    let quality = spec
        .output_quality()
        .filter(|_| format.supports_quality())
        .map(Quality::new);
    let format_type = match spec.output_format_type() {
        Some(FormatType::Scheme(scheme)) if format.format_types().contains(&scheme.as_str()) => {
            Some(scheme.clone())
        }
        _ => None,
    };
    EncodeParams {
        format,
        quality,
        format_type,
    }
}

/// Keep `path` if its extension already names `format`, otherwise append the
/// canonical extension: `thumb.png` written as JPEG becomes `thumb.png.jpg`.
pub fn resolve_destination(path: &Path, format: Format) -> PathBuf {
    let matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| format.matches_extension(e));
    if matches {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(format.canonical_extension());
    PathBuf::from(name)
}

pub fn resolve_output(
    spec: &ThumbnailSpec,
    native: Option<Format>,
    destination: Option<&Path>,
) -> Result<Resolved, CodecError> {
    let format = resolve_format(spec, native, destination)?;
    Ok(Resolved {
        params: resolve_params(spec, format),
        destination: destination.map(|path| resolve_destination(path, format)),
    })
}
