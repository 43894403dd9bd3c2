//! Shared test utilities for the thumbwright test suite.
//!
//! Synthetic images with predictable pixels, so assertions can check which
//! part of a source ended up where:
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let image = quadrants(40, 40);
//! assert_eq!(image.get_pixel(0, 0), RED);
//! assert_eq!(image.get_pixel(39, 39), WHITE);
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

// =========================================================================
// Synthetic images
// =========================================================================

/// RGB image whose red channel follows x and green channel follows y.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(2).saturating_sub(1).max(1)).min(255) as u8,
            (y * 255 / height.max(2).saturating_sub(1).max(1)).min(255) as u8,
            128,
        ])
    });
    DynamicImage::ImageRgb8(image)
}

pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color))
}

/// Opaque image split into four colored quarters:
/// red top-left, green top-right, blue bottom-left, white bottom-right.
pub fn quadrants(width: u32, height: u32) -> DynamicImage {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        match (x < width / 2, y < height / 2) {
            (true, true) => RED,
            (false, true) => GREEN,
            (true, false) => BLUE,
            (false, false) => WHITE,
        }
    });
    DynamicImage::ImageRgba8(image)
}

// =========================================================================
// Encoded fixtures
// =========================================================================

pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Write a gradient PNG of the given size.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    std::fs::write(path, encode_png(&gradient(width, height))).unwrap();
}
