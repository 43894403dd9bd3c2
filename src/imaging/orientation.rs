//! EXIF orientation: reading the tag and undoing the transform it records.
//!
//! ```text
//!     1: Normal      2: FlipH       3: Rotate180   4: FlipV
//!     5: Transpose   6: Rotate90    7: Transverse  8: Rotate270
//! ```
//!
//! Rotations are clockwise. Normalizing with [`Orientation::normalize`] yields
//! the image as it should be displayed, so every later stage can assume a
//! top-left origin.

use image::DynamicImage;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    /// Indexed by EXIF value - 1.
    pub const ALL: [Orientation; 8] = [
        Orientation::Normal,
        Orientation::FlipHorizontal,
        Orientation::Rotate180,
        Orientation::FlipVertical,
        Orientation::Transpose,
        Orientation::Rotate90,
        Orientation::Transverse,
        Orientation::Rotate270,
    ];

    /// Map an EXIF orientation value (1-8). Anything else is `None`.
    pub fn from_exif(value: u32) -> Option<Self> {
        (1..=8)
            .contains(&value)
            .then(|| Self::ALL[(value - 1) as usize])
    }

    pub fn exif_value(self) -> u32 {
        Self::ALL
            .iter()
            .position(|&o| o == self)
            .map(|i| i as u32 + 1)
            .unwrap_or(1)
    }

    /// Whether the displayed image has width and height swapped.
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90
                | Orientation::Transverse
                | Orientation::Rotate270
        )
    }

    /// Apply the recorded transform so the pixels read top-left first.
    pub fn normalize(self, image: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Normal => image,
            Orientation::FlipHorizontal => image.fliph(),
            Orientation::Rotate180 => image.rotate180(),
            Orientation::FlipVertical => image.flipv(),
            Orientation::Transpose => image.rotate90().fliph(),
            Orientation::Rotate90 => image.rotate90(),
            Orientation::Transverse => image.rotate270().fliph(),
            Orientation::Rotate270 => image.rotate270(),
        }
    }
}

/// Read the EXIF orientation tag from encoded bytes.
///
/// Missing EXIF data, a missing tag, or an out-of-range value all read as
/// [`Orientation::Normal`].
pub fn read_exif_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    let Ok(exif) = exif::Reader::new().read_from_container(&mut cursor) else {
        return Orientation::Normal;
    };

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .and_then(Orientation::from_exif)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    /// 3x2 image with a unique color per pixel.
    fn marked() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(3, 2, |x, y| {
            Rgba([(x * 80) as u8, (y * 120) as u8, 7, 255])
        }))
    }

    fn pixel(image: &DynamicImage, x: u32, y: u32) -> [u8; 4] {
        image.get_pixel(x, y).0
    }

    #[test]
    fn exif_values_map_in_order() {
        assert_eq!(Orientation::from_exif(1), Some(Orientation::Normal));
        assert_eq!(Orientation::from_exif(6), Some(Orientation::Rotate90));
        assert_eq!(Orientation::from_exif(8), Some(Orientation::Rotate270));
        assert_eq!(Orientation::from_exif(0), None);
        assert_eq!(Orientation::from_exif(9), None);
        assert_eq!(Orientation::Transverse.exif_value(), 7);
    }

    #[test]
    fn axis_swapping_orientations_swap_dimensions() {
        for orientation in Orientation::ALL {
            let out = orientation.normalize(marked());
            let expected = if orientation.swaps_axes() { (2, 3) } else { (3, 2) };
            assert_eq!(out.dimensions(), expected, "{orientation:?}");
        }
    }

    #[test]
    fn transpose_mirrors_over_main_diagonal() {
        let source = marked();
        let out = Orientation::Transpose.normalize(source.clone());
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(pixel(&out, y, x), pixel(&source, x, y));
            }
        }
    }

    #[test]
    fn transverse_mirrors_over_anti_diagonal() {
        let source = marked();
        let out = Orientation::Transverse.normalize(source.clone());
        // (x, y) in a 3x2 source lands at (1 - y, 2 - x) in the 2x3 result
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(pixel(&out, 1 - y, 2 - x), pixel(&source, x, y));
            }
        }
    }

    #[test]
    fn rotate90_moves_top_left_to_top_right() {
        let source = marked();
        let out = Orientation::Rotate90.normalize(source.clone());
        assert_eq!(pixel(&out, 1, 0), pixel(&source, 0, 0));
    }

    #[test]
    fn missing_exif_reads_as_normal() {
        assert_eq!(read_exif_orientation(b"not an image"), Orientation::Normal);
        assert_eq!(
            read_exif_orientation(&crate::test_helpers::encode_png(&marked())),
            Orientation::Normal
        );
    }
}
