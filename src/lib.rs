//! # Thumbwright
//!
//! Thumbnail generation from validated directives. Callers describe a
//! thumbnail with a chain of directives (size, crop, watermark, output
//! format, ...), each checked the moment it is given, and then run that
//! description over one or many inputs.
//!
//! ```no_run
//! use std::path::Path;
//! use thumbwright::Thumbnails;
//! use thumbwright::naming::Renames;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let outcomes = Thumbnails::of_paths(["a.jpg", "b.png"])?
//!     .bounds(320, 320)?
//!     .output_format("jpeg")?
//!     .output_quality(0.8)?
//!     .to_dir(Path::new("thumbs"), &Renames::SuffixHyphenThumbnail)?;
//! for outcome in &outcomes {
//!     if let Err(e) = &outcome.result {
//!         eprintln!("{}: {}", outcome.name, e);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture: Configure, Freeze, Run
//!
//! ```text
//! directives ──► SpecBuilder ──freeze──► Arc<ThumbnailSpec>
//!                                             │
//! input ──decode──► region ──► resize ──► crop ──► watermark ──encode──► output
//! ```
//!
//! The builder is the only place a spec is validated. Once frozen, the spec
//! is immutable and shared read-only by every worker of a batch, so the
//! pipeline itself never has to re-check configuration. Pipeline stages are
//! distinct types ([`pipeline::Stage`]) and can only be chained in order.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`thumbnails`] | Fluent entry point: inputs, directives, single and batch terminals |
//! | [`builder`] | Directive state machine, the guard table for every directive |
//! | [`spec`] | The frozen spec and its value types (sizing modes, hints, formats) |
//! | [`geometry`] | Sizes, coordinates, anchored positions and regions |
//! | [`sizing`] | Target size calculation from source size and sizing mode |
//! | [`pipeline`] | Typed stages: orientation, region, resize, crop, watermark, encode |
//! | [`resolve`] | Output format, encoder parameters and destination file name |
//! | [`imaging`] | Codec and resizer traits with the `image`-crate implementations |
//! | [`source`] | Input kinds and directory expansion |
//! | [`naming`] | Output file naming for batch writes |
//! | [`config`] | TOML recipes for the CLI |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Errors at the Call That Caused Them
//!
//! Every directive returns `Result<Self, SpecError>`. A conflicting or out of
//! range directive fails right there, with a message naming the earlier
//! directive it conflicts with, instead of surfacing later as a confusing
//! image. The one exception is a source region that falls outside an image:
//! that depends on the image, so it fails only that input at run time.
//!
//! ## Per-Input Outcomes
//!
//! Batch terminals return one [`Outcome`] per input, in input order. A
//! corrupt file or an existing destination fails that input and nothing
//! else.
//!
//! ## Pluggable Codec and Resizers
//!
//! Decoding and encoding go through [`imaging::ImageCodec`], resampling
//! through [`imaging::Resizer`]. The defaults are pure Rust (`image` crate,
//! EXIF orientation via `kamadak-exif`); tests swap in a recording mock.

pub mod builder;
pub mod config;
pub mod geometry;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod sizing;
pub mod source;
pub mod spec;
pub mod thumbnails;

pub use thumbnails::{Outcome, Thumbnails};

#[cfg(test)]
pub(crate) mod test_helpers;
