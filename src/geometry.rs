//! Geometry primitives shared by every stage: sizes, coordinates, anchor
//! positions and regions.
//!
//! Everything here is a `Copy` value type with no I/O. Anchor math uses
//! signed 64-bit arithmetic so components larger than their enclosing box
//! resolve to negative offsets instead of wrapping.

use crate::spec::SpecError;
use serde::Deserialize;
use std::fmt;

/// Axis length meaning "no constraint on this axis".
pub const UNBOUNDED: u32 = u32::MAX;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Clamp each axis to `bounds`. Used to turn a requested (possibly
    /// unbounded) box into something that fits an actual image.
    pub fn min(self, bounds: Size) -> Self {
        Self {
            width: self.width.min(bounds.width),
            height: self.height.min(bounds.height),
        }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A literal point; may lie outside the image it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Coordinate {
    pub x: i64,
    pub y: i64,
}

impl Coordinate {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Where a component (crop window, watermark, source region) sits inside an
/// enclosing box.
///
/// The nine named anchors align the component against edges or centers of
/// the enclosing box; `At` places it at a fixed coordinate.
///
/// ```text
///   TopLeft      TopCenter     TopRight
///   CenterLeft   Center        CenterRight
///   BottomLeft   BottomCenter  BottomRight
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "PositionRepr")]
pub enum Position {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    At(Coordinate),
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Start,
    Middle,
    End,
}

impl Align {
    fn offset(self, enclosing: u32, component: u32, inset: u32) -> i64 {
        let (enclosing, component, inset) = (enclosing as i64, component as i64, inset as i64);
        match self {
            Align::Start => inset,
            Align::Middle => (enclosing - component) / 2,
            Align::End => enclosing - component - inset,
        }
    }
}

impl Position {
    /// Top-left corner of `component` placed inside `enclosing`.
    ///
    /// `inset` pulls edge-aligned axes inward and is ignored on centered
    /// axes and for `At`. Division truncates toward zero.
    pub fn resolve(self, enclosing: Size, component: Size, inset: u32) -> Coordinate {
        let (horizontal, vertical) = match self {
            Position::At(point) => return point,
            Position::TopLeft => (Align::Start, Align::Start),
            Position::TopCenter => (Align::Middle, Align::Start),
            Position::TopRight => (Align::End, Align::Start),
            Position::CenterLeft => (Align::Start, Align::Middle),
            Position::Center => (Align::Middle, Align::Middle),
            Position::CenterRight => (Align::End, Align::Middle),
            Position::BottomLeft => (Align::Start, Align::End),
            Position::BottomCenter => (Align::Middle, Align::End),
            Position::BottomRight => (Align::End, Align::End),
        };
        Coordinate {
            x: horizontal.offset(enclosing.width, component.width, inset),
            y: vertical.offset(enclosing.height, component.height, inset),
        }
    }

    /// Parse a kebab-case anchor name (`"bottom-right"`).
    pub fn from_name(name: &str) -> Option<Self> {
        let anchor = match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "top-left" => Position::TopLeft,
            "top-center" => Position::TopCenter,
            "top-right" => Position::TopRight,
            "center-left" => Position::CenterLeft,
            "center" => Position::Center,
            "center-right" => Position::CenterRight,
            "bottom-left" => Position::BottomLeft,
            "bottom-center" => Position::BottomCenter,
            "bottom-right" => Position::BottomRight,
            _ => return None,
        };
        Some(anchor)
    }
}

impl From<Coordinate> for Position {
    fn from(point: Coordinate) -> Self {
        Position::At(point)
    }
}

/// Recipe representation: either `"center"` or `{ x = 10, y = 20 }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Named(String),
    At(Coordinate),
}

impl TryFrom<PositionRepr> for Position {
    type Error = String;

    fn try_from(repr: PositionRepr) -> Result<Self, Self::Error> {
        match repr {
            PositionRepr::At(point) => Ok(Position::At(point)),
            PositionRepr::Named(name) => {
                Position::from_name(&name).ok_or_else(|| format!("unknown position: {name}"))
            }
        }
    }
}

/// A pixel rectangle with non-negative origin, already clipped to an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// A positioned box, resolved against an image only once its size is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub position: Position,
    pub size: Size,
}

impl Region {
    pub fn new(position: Position, size: Size) -> Self {
        Self { position, size }
    }

    /// Resolve against `enclosing` and clip to its bounds.
    ///
    /// Parts hanging off the image are cut away; a region with nothing left
    /// inside the image is an `InvalidArgument`.
    pub fn calculate(&self, enclosing: Size) -> Result<Rect, SpecError> {
        let origin = self.position.resolve(enclosing, self.size, 0);
        let (left, right) = clip(origin.x, self.size.width, enclosing.width);
        let (top, bottom) = clip(origin.y, self.size.height, enclosing.height);

        if right <= left || bottom <= top {
            return Err(SpecError::InvalidArgument(format!(
                "region {} at ({}, {}) lies outside the {} image",
                self.size, origin.x, origin.y, enclosing
            )));
        }

        Ok(Rect {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}

fn clip(start: i64, length: u32, bound: u32) -> (i64, i64) {
    let end = start.saturating_add(length as i64);
    (start.max(0), end.min(bound as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: Size = Size::new(100, 80);
    const PIECE: Size = Size::new(20, 10);

    // =========================================================================
    // Position::resolve
    // =========================================================================

    #[test]
    fn corners_without_inset() {
        assert_eq!(Position::TopLeft.resolve(CANVAS, PIECE, 0), Coordinate::new(0, 0));
        assert_eq!(Position::TopRight.resolve(CANVAS, PIECE, 0), Coordinate::new(80, 0));
        assert_eq!(Position::BottomLeft.resolve(CANVAS, PIECE, 0), Coordinate::new(0, 70));
        assert_eq!(Position::BottomRight.resolve(CANVAS, PIECE, 0), Coordinate::new(80, 70));
    }

    #[test]
    fn inset_pulls_edges_inward() {
        assert_eq!(Position::TopLeft.resolve(CANVAS, PIECE, 5), Coordinate::new(5, 5));
        assert_eq!(Position::BottomRight.resolve(CANVAS, PIECE, 5), Coordinate::new(75, 65));
    }

    #[test]
    fn inset_ignored_on_centered_axes() {
        assert_eq!(Position::Center.resolve(CANVAS, PIECE, 7), Coordinate::new(40, 35));
        assert_eq!(Position::TopCenter.resolve(CANVAS, PIECE, 7), Coordinate::new(40, 7));
        assert_eq!(Position::CenterRight.resolve(CANVAS, PIECE, 7), Coordinate::new(73, 35));
        assert_eq!(Position::BottomCenter.resolve(CANVAS, PIECE, 7), Coordinate::new(40, 63));
        assert_eq!(Position::CenterLeft.resolve(CANVAS, PIECE, 7), Coordinate::new(7, 35));
    }

    #[test]
    fn center_truncates_odd_remainder() {
        // (101 - 20) / 2 = 40.5 → 40
        let at = Position::Center.resolve(Size::new(101, 81), PIECE, 0);
        assert_eq!(at, Coordinate::new(40, 35));
    }

    #[test]
    fn center_truncates_toward_zero_when_component_is_larger() {
        // (10 - 15) / 2 = -2.5 → -2
        let at = Position::Center.resolve(Size::new(10, 10), Size::new(15, 15), 0);
        assert_eq!(at, Coordinate::new(-2, -2));
    }

    #[test]
    fn coordinate_ignores_sizes_and_inset() {
        let at = Position::At(Coordinate::new(-3, 12));
        assert_eq!(at.resolve(CANVAS, PIECE, 9), Coordinate::new(-3, 12));
    }

    #[test]
    fn anchor_names_parse() {
        assert_eq!(Position::from_name("bottom-right"), Some(Position::BottomRight));
        assert_eq!(Position::from_name("Top_Left"), Some(Position::TopLeft));
        assert_eq!(Position::from_name("middle"), None);
    }

    #[test]
    fn position_deserializes_from_name_or_coordinate() {
        #[derive(Deserialize)]
        struct Holder {
            a: Position,
            b: Position,
        }
        let holder: Holder = toml::from_str("a = \"center-left\"\nb = { x = 4, y = 9 }").unwrap();
        assert_eq!(holder.a, Position::CenterLeft);
        assert_eq!(holder.b, Position::At(Coordinate::new(4, 9)));

        let unknown = toml::from_str::<Holder>("a = \"middle\"\nb = \"center\"");
        assert!(unknown.is_err());
    }

    // =========================================================================
    // Region::calculate
    // =========================================================================

    #[test]
    fn region_inside_image_is_unchanged() {
        let region = Region::new(Position::At(Coordinate::new(10, 5)), Size::new(30, 20));
        assert_eq!(
            region.calculate(CANVAS).unwrap(),
            Rect { x: 10, y: 5, width: 30, height: 20 }
        );
    }

    #[test]
    fn region_with_anchor_resolves_against_image() {
        let region = Region::new(Position::BottomRight, Size::new(30, 20));
        assert_eq!(
            region.calculate(CANVAS).unwrap(),
            Rect { x: 70, y: 60, width: 30, height: 20 }
        );
    }

    #[test]
    fn region_overhang_is_clipped() {
        let region = Region::new(Position::At(Coordinate::new(-10, 70)), Size::new(30, 20));
        assert_eq!(
            region.calculate(CANVAS).unwrap(),
            Rect { x: 0, y: 70, width: 20, height: 10 }
        );
    }

    #[test]
    fn region_fully_outside_is_invalid_argument() {
        let region = Region::new(Position::At(Coordinate::new(200, 0)), Size::new(30, 20));
        assert!(matches!(
            region.calculate(CANVAS),
            Err(SpecError::InvalidArgument(_))
        ));
    }

    #[test]
    fn size_min_clamps_unbounded_axis() {
        let requested = Size::new(50, UNBOUNDED);
        assert_eq!(requested.min(Size::new(60, 45)), Size::new(50, 45));
    }
}
