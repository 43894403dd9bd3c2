//! Watermark compositing.
//!
//! Blends with `a = opacity * source_alpha` and
//! `dst = dst * (1 - a) + src * a` per channel. The canvas alpha ends up as
//! `dst_alpha + a * (1 - dst_alpha)`. Parts of the watermark outside the
//! canvas are clipped.

use crate::geometry::Size;
use crate::spec::Watermark;
use image::{DynamicImage, GenericImageView, RgbaImage};

/// Stamp `watermark` onto `canvas`. The result is always RGBA8.
pub fn apply_watermark(canvas: DynamicImage, watermark: &Watermark) -> DynamicImage {
    let mut canvas: RgbaImage = canvas.into_rgba8();
    let enclosing = Size::new(canvas.width(), canvas.height());
    let (mark_width, mark_height) = watermark.image.dimensions();
    let origin = watermark
        .position
        .resolve(enclosing, Size::new(mark_width, mark_height), watermark.inset);

    let opacity = watermark.opacity.clamp(0.0, 1.0);
    if opacity > 0.0 {
        let mark = watermark.image.to_rgba8();
        for (mx, my, src) in mark.enumerate_pixels() {
            let (Some(x), Some(y)) = (
                origin.x.checked_add(i64::from(mx)),
                origin.y.checked_add(i64::from(my)),
            ) else {
                continue;
            };
            if x < 0 || y < 0 || x >= i64::from(enclosing.width) || y >= i64::from(enclosing.height) {
                continue;
            }

            let a = opacity * f32::from(src[3]) / 255.0;
            if a <= 0.0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(x as u32, y as u32);
            for channel in 0..3 {
                dst[channel] = blend(dst[channel], src[channel], a);
            }
            let dst_alpha = f32::from(dst[3]) / 255.0;
            dst[3] = ((dst_alpha + a * (1.0 - dst_alpha)) * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }

    DynamicImage::ImageRgba8(canvas)
}

fn blend(dst: u8, src: u8, a: f32) -> u8 {
    (f32::from(dst) * (1.0 - a) + f32::from(src) * a)
        .round()
        .clamp(0.0, 255.0) as u8
}
