//! Output file naming for batch writes.
//!
//! A [`Rename`] maps an input's file name to the name of its thumbnail. The
//! five standard renames insert `thumbnail` as a prefix or suffix:
//!
//! - `no-change`: `photo.jpg` → `photo.jpg`
//! - `prefix-dot-thumbnail`: `photo.jpg` → `thumbnail.photo.jpg`
//! - `prefix-hyphen-thumbnail`: `photo.jpg` → `thumbnail-photo.jpg`
//! - `suffix-dot-thumbnail`: `photo.jpg` → `photo.thumbnail.jpg`
//! - `suffix-hyphen-thumbnail`: `photo.jpg` → `photo-thumbnail.jpg`
//!
//! Suffixes go before the extension. The extension itself is left alone;
//! the [`resolve`](crate::resolve) module appends the output format's
//! extension afterwards if it differs.

use crate::spec::ThumbnailSpec;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Derive an output name from an input name.
pub trait Rename: Send + Sync {
    fn apply(&self, name: &str, spec: &ThumbnailSpec) -> String;
}

impl<F> Rename for F
where
    F: Fn(&str, &ThumbnailSpec) -> String + Send + Sync,
{
    fn apply(&self, name: &str, spec: &ThumbnailSpec) -> String {
        self(name, spec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Renames {
    #[default]
    NoChange,
    PrefixDotThumbnail,
    PrefixHyphenThumbnail,
    SuffixDotThumbnail,
    SuffixHyphenThumbnail,
}

impl Renames {
    pub const ALL: [Renames; 5] = [
        Renames::NoChange,
        Renames::PrefixDotThumbnail,
        Renames::PrefixHyphenThumbnail,
        Renames::SuffixDotThumbnail,
        Renames::SuffixHyphenThumbnail,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Renames::NoChange => "no-change",
            Renames::PrefixDotThumbnail => "prefix-dot-thumbnail",
            Renames::PrefixHyphenThumbnail => "prefix-hyphen-thumbnail",
            Renames::SuffixDotThumbnail => "suffix-dot-thumbnail",
            Renames::SuffixHyphenThumbnail => "suffix-hyphen-thumbnail",
        }
    }
}

impl fmt::Display for Renames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Renames {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rename| rename.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|r| r.name()).collect();
                format!("unknown rename '{s}', expected one of: {}", known.join(", "))
            })
    }
}

impl Rename for Renames {
    fn apply(&self, name: &str, _spec: &ThumbnailSpec) -> String {
        let (stem, extension) = split_extension(name);
        let renamed_stem = match self {
            Renames::NoChange => return name.to_string(),
            Renames::PrefixDotThumbnail => format!("thumbnail.{stem}"),
            Renames::PrefixHyphenThumbnail => format!("thumbnail-{stem}"),
            Renames::SuffixDotThumbnail => format!("{stem}.thumbnail"),
            Renames::SuffixHyphenThumbnail => format!("{stem}-thumbnail"),
        };
        match extension {
            Some(extension) => format!("{renamed_stem}.{extension}"),
            None => renamed_stem,
        }
    }
}

/// Split at the last dot. A leading dot (hidden file) is part of the stem.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < name.len() => (&name[..dot], Some(&name[dot + 1..])),
        _ => (name, None),
    }
}
