//! Parameter types for encoding.
//!
//! These structs describe *what* to write, not *how*. The
//! [`resolve`](crate::resolve) module fills them in from the spec and the
//! source; the [`codec`](super::codec) turns them into encoder settings.

use super::format::Format;

/// Lossy encoding quality as a fraction (0.0-1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f64);

impl Quality {
    /// Clamped on construction; NaN becomes the default.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Encoder scale (1-100). Zero quality still encodes at 1.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.9)
    }
}

/// Fully resolved encoder input.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams {
    pub format: Format,
    /// Only set when the format takes a quality setting.
    pub quality: Option<Quality>,
    /// Only set for a named scheme the format offers.
    pub format_type: Option<String>,
}

impl EncodeParams {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            quality: None,
            format_type: None,
        }
    }
}
