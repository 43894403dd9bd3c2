//! Image formats the default codec can read and write.
//!
//! | Format | Read | Quality | Format types | Alpha |
//! |---|---|---|---|---|
//! | JPEG | yes | yes | - | no |
//! | PNG | yes | - | `fast`, `best` | yes |
//! | GIF | yes | - | - | yes |
//! | BMP | yes | - | - | yes |
//! | TIFF | yes | - | - | yes |
//! | WebP | yes | - | `lossless` | yes |
//! | AVIF | no | yes | - | yes |
//!
//! AVIF is output-only: the `image` crate's `"avif"` feature compiles the
//! rav1e encoder but no decoder.

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
    WebP,
    Avif,
}

impl Format {
    pub const ALL: [Format; 7] = [
        Format::Jpeg,
        Format::Png,
        Format::Gif,
        Format::Bmp,
        Format::Tiff,
        Format::WebP,
        Format::Avif,
    ];

    /// Look up a format by name or extension, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == name || format.extensions().contains(&name.as_str()))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Jpeg => "jpeg",
            Format::Png => "png",
            Format::Gif => "gif",
            Format::Bmp => "bmp",
            Format::Tiff => "tiff",
            Format::WebP => "webp",
            Format::Avif => "avif",
        }
    }

    /// Known file extensions; the first one is canonical.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Format::Jpeg => &["jpg", "jpeg"],
            Format::Png => &["png"],
            Format::Gif => &["gif"],
            Format::Bmp => &["bmp"],
            Format::Tiff => &["tif", "tiff"],
            Format::WebP => &["webp"],
            Format::Avif => &["avif"],
        }
    }

    pub fn canonical_extension(self) -> &'static str {
        self.extensions()[0]
    }

    pub fn matches_extension(self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    pub fn readable(self) -> bool {
        !matches!(self, Format::Avif)
    }

    pub fn supports_quality(self) -> bool {
        matches!(self, Format::Jpeg | Format::Avif)
    }

    /// Compression schemes accepted by `output_format_type`, besides the
    /// default sentinel. Empty means the encoder has no such setting.
    pub fn format_types(self) -> &'static [&'static str] {
        match self {
            Format::Png => &["fast", "best"],
            Format::WebP => &["lossless"],
            _ => &[],
        }
    }

    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Format::Jpeg => image::ImageFormat::Jpeg,
            Format::Png => image::ImageFormat::Png,
            Format::Gif => image::ImageFormat::Gif,
            Format::Bmp => image::ImageFormat::Bmp,
            Format::Tiff => image::ImageFormat::Tiff,
            Format::WebP => image::ImageFormat::WebP,
            Format::Avif => image::ImageFormat::Avif,
        }
    }

    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.to_image_format() == format)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extensions of every format that can be decoded, for input discovery.
pub fn supported_input_extensions() -> Vec<&'static str> {
    Format::ALL
        .into_iter()
        .filter(|format| format.readable())
        .flat_map(|format| format.extensions().iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_extensions_resolve() {
        assert_eq!(Format::from_name("JPG"), Some(Format::Jpeg));
        assert_eq!(Format::from_name("jpeg"), Some(Format::Jpeg));
        assert_eq!(Format::from_name(".tif"), Some(Format::Tiff));
        assert_eq!(Format::from_name("WebP"), Some(Format::WebP));
        assert_eq!(Format::from_name("psd"), None);
    }

    #[test]
    fn path_extension_resolves() {
        assert_eq!(Format::from_path(Path::new("a/b.PNG")), Some(Format::Png));
        assert_eq!(Format::from_path(Path::new("noext")), None);
    }

    #[test]
    fn canonical_extension_is_first() {
        assert_eq!(Format::Jpeg.canonical_extension(), "jpg");
        assert!(Format::Jpeg.matches_extension("JPEG"));
        assert!(!Format::Png.matches_extension("jpg"));
    }

    #[test]
    fn avif_is_not_an_input_extension() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp"] {
            assert!(exts.contains(expected), "expected {expected} in input extensions");
        }
        assert!(!exts.contains(&"avif"));
    }
}
