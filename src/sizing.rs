//! Pure calculation of thumbnail dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! Rounding is half away from zero (`f64::round`) on every axis, and no axis
//! ever drops below one pixel. An axis set to [`UNBOUNDED`] places no
//! constraint: under [`AspectPolicy::Preserve`] the other axis alone decides
//! the scale, under forced sizes it keeps the source length.

use crate::geometry::{Size, UNBOUNDED};
use crate::spec::{AspectPolicy, SizingMode, SpecError};

/// How a preserved-aspect resize relates to the requested box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// The result fits entirely inside the box.
    Contain,
    /// The result covers the box; each axis is at least the requested length.
    Cover,
}

/// Calculate the dimensions the resizer should produce.
///
/// # Examples
/// ```
/// # use thumbwright::geometry::Size;
/// # use thumbwright::sizing::{calculate_target, FitMode};
/// # use thumbwright::spec::{AspectPolicy, SizingMode};
/// let sizing = SizingMode::ExplicitSize { width: 120, height: 50 };
/// let target = calculate_target(Size::new(200, 200), sizing, AspectPolicy::Preserve, FitMode::Contain);
/// assert_eq!(target.unwrap(), Size::new(50, 50));
/// ```
pub fn calculate_target(
    source: Size,
    sizing: SizingMode,
    aspect: AspectPolicy,
    fit: FitMode,
) -> Result<Size, SpecError> {
    if source.is_empty() {
        return Err(SpecError::InvalidArgument(format!(
            "source image has no pixels ({source})"
        )));
    }

    let target = match sizing {
        SizingMode::Unset => {
            return Err(SpecError::InvalidArgument("size is not set".into()));
        }
        SizingMode::ExplicitSize { width, height }
        | SizingMode::WidthAndHeight { width, height } => match aspect {
            AspectPolicy::Ignore => exact(source, width, height),
            AspectPolicy::Preserve | AspectPolicy::Unset => {
                proportional(source, width, height, fit)
            }
        },
        SizingMode::WidthOnly(width) => proportional(source, width, UNBOUNDED, FitMode::Contain),
        SizingMode::HeightOnly(height) => proportional(source, UNBOUNDED, height, FitMode::Contain),
        SizingMode::Scale(factor) => scaled(source, factor, factor),
        SizingMode::ScaleXY(fx, fy) => scaled(source, fx, fy),
        SizingMode::ForceSize { width, height } => exact(source, width, height),
    };
    Ok(target)
}

fn exact(source: Size, width: u32, height: u32) -> Size {
    Size::new(
        if width == UNBOUNDED { source.width } else { width },
        if height == UNBOUNDED { source.height } else { height },
    )
}

fn proportional(source: Size, width: u32, height: u32, fit: FitMode) -> Size {
    let ratio = |target: u32, length: u32| {
        (target != UNBOUNDED).then(|| target as f64 / length as f64)
    };

    let scale = match (ratio(width, source.width), ratio(height, source.height)) {
        (Some(rx), Some(ry)) => match fit {
            FitMode::Contain => rx.min(ry),
            FitMode::Cover => rx.max(ry),
        },
        (Some(rx), None) => rx,
        (None, Some(ry)) => ry,
        (None, None) => 1.0,
    };

    let mut result = scaled(source, scale, scale);

    // Float error must never leave a covering axis a pixel short of the box
    if fit == FitMode::Cover {
        if width != UNBOUNDED {
            result.width = result.width.max(width);
        }
        if height != UNBOUNDED {
            result.height = result.height.max(height);
        }
    }
    result
}

fn scaled(source: Size, fx: f64, fy: f64) -> Size {
    Size::new(scale_axis(source.width, fx), scale_axis(source.height, fy))
}

fn scale_axis(length: u32, factor: f64) -> u32 {
    // `as` saturates, so enormous factors clamp to u32::MAX - 1 at worst
    let scaled = (length as f64 * factor).round().max(1.0);
    (scaled as u32).min(UNBOUNDED - 1)
}
