//! End-to-end tests through the public API: real encoding and decoding,
//! real files, whole batches.

use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use thumbwright::Thumbnails;
use thumbwright::config::parse_recipe;
use thumbwright::geometry::Position;
use thumbwright::imaging::{
    CodecError, Decoded, EncodeParams, Format, ImageCodec, Orientation, RustCodec,
};
use thumbwright::naming::Renames;
use thumbwright::pipeline::ThumbnailError;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Red top-left, green top-right, blue bottom-left, white bottom-right.
fn quadrants(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        match (x < width / 2, y < height / 2) {
            (true, true) => RED,
            (false, true) => GREEN,
            (true, false) => BLUE,
            (false, false) => WHITE,
        }
    }))
}

fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn is_close(actual: Rgba<u8>, expected: Rgba<u8>) -> bool {
    actual
        .0
        .iter()
        .zip(expected.0.iter())
        .all(|(a, e)| a.abs_diff(*e) <= 8)
}

// =========================================================================
// Crop
// =========================================================================

#[test]
fn crop_takes_anchored_window_of_cover_fit_resize() {
    // 200x200 covers 100x50 at 100x100; the window is 100x50 inside it
    let centered = Thumbnails::of_images([quadrants(200, 200)])
        .unwrap()
        .size(100, 50)
        .unwrap()
        .crop(Position::Center)
        .unwrap()
        .as_image()
        .unwrap();
    assert_eq!(centered.dimensions(), (100, 50));
    assert!(is_close(centered.get_pixel(5, 5), RED));
    assert!(is_close(centered.get_pixel(94, 5), GREEN));
    assert!(is_close(centered.get_pixel(5, 44), BLUE));
    assert!(is_close(centered.get_pixel(94, 44), WHITE));

    let top = Thumbnails::of_images([quadrants(200, 200)])
        .unwrap()
        .size(100, 50)
        .unwrap()
        .crop(Position::TopLeft)
        .unwrap()
        .as_image()
        .unwrap();
    assert_eq!(top.dimensions(), (100, 50));
    assert!(is_close(top.get_pixel(5, 44), RED));
    assert!(is_close(top.get_pixel(94, 44), GREEN));
}

#[test]
fn square_source_in_a_box_keeps_its_aspect() {
    let image = Thumbnails::of_images([quadrants(300, 300)])
        .unwrap()
        .size(120, 80)
        .unwrap()
        .as_image()
        .unwrap();
    assert_eq!(image.dimensions(), (80, 80));

    let forced = Thumbnails::of_images([quadrants(300, 300)])
        .unwrap()
        .size(120, 80)
        .unwrap()
        .keep_aspect_ratio(false)
        .unwrap()
        .as_image()
        .unwrap();
    assert_eq!(forced.dimensions(), (120, 80));
}

// =========================================================================
// Watermarks
// =========================================================================

/// Bounding box (x0, y0, x1, y1) of the red pixels.
fn red_box(image: &DynamicImage) -> (u32, u32, u32, u32) {
    let red: Vec<(u32, u32)> = image
        .pixels()
        .filter(|(_, _, p)| *p == RED)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!red.is_empty(), "no watermark pixels found");
    (
        red.iter().map(|p| p.0).min().unwrap(),
        red.iter().map(|p| p.1).min().unwrap(),
        red.iter().map(|p| p.0).max().unwrap() + 1,
        red.iter().map(|p| p.1).max().unwrap() + 1,
    )
}

fn stamped(position: Position) -> DynamicImage {
    let canvas = DynamicImage::ImageRgba8(RgbaImage::from_pixel(60, 40, WHITE));
    let mark = Arc::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 6, RED)));
    Thumbnails::of_images([canvas])
        .unwrap()
        .size(60, 40)
        .unwrap()
        .watermark(position, mark, 1.0)
        .unwrap()
        .as_image()
        .unwrap()
}

#[test]
fn watermark_anchors_are_symmetric() {
    assert_eq!(red_box(&stamped(Position::TopLeft)), (0, 0, 10, 6));
    assert_eq!(red_box(&stamped(Position::BottomRight)), (50, 34, 60, 40));

    let (x0, y0, x1, y1) = red_box(&stamped(Position::Center));
    assert_eq!(x0, 60 - x1);
    assert_eq!(y0, 40 - y1);
}

// =========================================================================
// EXIF orientation
// =========================================================================

/// Hands out `displayed` stored the way a camera with `orientation` would
/// have stored it, and encodes as PNG.
struct OrientedCodec {
    displayed: DynamicImage,
    orientation: Orientation,
}

impl OrientedCodec {
    fn stored(&self) -> DynamicImage {
        let image = self.displayed.clone();
        match self.orientation {
            Orientation::Normal => image,
            Orientation::FlipHorizontal => image.fliph(),
            Orientation::Rotate180 => image.rotate180(),
            Orientation::FlipVertical => image.flipv(),
            Orientation::Transpose => image.fliph().rotate270(),
            Orientation::Rotate90 => image.rotate270(),
            Orientation::Transverse => image.fliph().rotate90(),
            Orientation::Rotate270 => image.rotate90(),
        }
    }
}

impl ImageCodec for OrientedCodec {
    fn decode(&self, _bytes: &[u8]) -> Result<Decoded, CodecError> {
        Ok(Decoded {
            image: self.stored(),
            orientation: self.orientation,
            format: Some(Format::Png),
        })
    }

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
        RustCodec::new().encode(image, params)
    }
}

#[test]
fn every_orientation_tag_gives_the_same_thumbnail() {
    let displayed = quadrants(64, 32);
    let logo = Arc::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        6,
        4,
        Rgba([0, 0, 0, 255]),
    )));
    let render = |orientation: Orientation| {
        let codec = OrientedCodec {
            displayed: displayed.clone(),
            orientation,
        };
        Thumbnails::of_bytes([vec![0u8]])
            .unwrap()
            .with_codec(Arc::new(codec))
            .size(32, 32)
            .unwrap()
            .crop(Position::TopLeft)
            .unwrap()
            .watermark(Position::BottomRight, logo.clone(), 1.0)
            .unwrap()
            .as_image()
            .unwrap()
            .to_rgba8()
    };

    let expected = render(Orientation::Normal);
    assert_eq!(expected.dimensions(), (32, 32));
    assert_eq!(*expected.get_pixel(0, 0), RED);
    assert_eq!(*expected.get_pixel(0, 31), BLUE);
    assert_eq!(*expected.get_pixel(31, 31), Rgba([0, 0, 0, 255]));
    assert_eq!(*expected.get_pixel(25, 27), BLUE);
    for value in 2..=8 {
        let orientation = Orientation::from_exif(value).unwrap();
        assert_eq!(render(orientation), expected, "orientation tag {value}");
    }
}

/// JPEG bytes carrying an EXIF APP1 segment with the given orientation tag.
fn jpeg_with_orientation(image: &DynamicImage, tag: u8) -> Vec<u8> {
    let mut jpeg = Vec::new();
    image
        .to_rgb8()
        .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .unwrap();

    let mut app1 = vec![0xFF, 0xE1, 0x00, 0x22];
    app1.extend_from_slice(b"Exif\0\0");
    app1.extend_from_slice(&[b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08]);
    app1.extend_from_slice(&[0x00, 0x01]);
    app1.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, tag, 0x00, 0x00]);
    app1.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

    let mut bytes = jpeg[..2].to_vec();
    bytes.extend(app1);
    bytes.extend_from_slice(&jpeg[2..]);
    bytes
}

#[test]
fn exif_orientation_in_a_real_jpeg_is_applied() {
    let bytes = jpeg_with_orientation(&quadrants(64, 32), 6);

    let decoded = RustCodec::new().decode(&bytes).unwrap();
    assert_eq!(decoded.orientation, Orientation::Rotate90);
    assert_eq!(decoded.image.dimensions(), (64, 32));

    let image = Thumbnails::of_bytes([bytes])
        .unwrap()
        .scale(1.0)
        .unwrap()
        .as_image()
        .unwrap();
    assert_eq!(image.dimensions(), (32, 64));
    // Tag 6 turns the stored top-left (red) into the displayed top-right.
    assert!(is_close(image.get_pixel(29, 2), RED));
    assert!(is_close(image.get_pixel(2, 2), BLUE));
}

#[test]
fn orientation_can_be_ignored() {
    let codec = OrientedCodec {
        displayed: quadrants(64, 32),
        orientation: Orientation::Rotate90,
    };
    let image = Thumbnails::of_bytes([vec![0u8]])
        .unwrap()
        .with_codec(Arc::new(codec))
        .use_exif_orientation(false)
        .unwrap()
        .scale(1.0)
        .unwrap()
        .as_image()
        .unwrap();
    assert_eq!(image.dimensions(), (32, 64));
}

// =========================================================================
// Batches
// =========================================================================

#[test]
fn one_bad_input_does_not_affect_the_others() {
    let good = png_bytes(&quadrants(20, 20));
    let outcomes = Thumbnails::of_bytes([good.clone(), b"not an image".to_vec(), good])
        .unwrap()
        .width(10)
        .unwrap()
        .as_images()
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_ok());
    assert!(matches!(
        outcomes[1].result,
        Err(ThumbnailError::Codec(CodecError::UnsupportedFormat(_)))
    ));
    assert_eq!(outcomes[1].name, "input #2");
    assert!(outcomes[2].is_ok());
}

#[test]
fn encoded_bytes_decode_in_the_requested_format() {
    let encoded = Thumbnails::of_bytes([png_bytes(&quadrants(40, 40))])
        .unwrap()
        .scale(0.5)
        .unwrap()
        .output_format("jpeg")
        .unwrap()
        .output_quality(0.9)
        .unwrap()
        .as_bytes()
        .unwrap();
    assert_eq!(encoded.format, Format::Jpeg);
    assert_eq!(image::guess_format(&encoded.bytes).unwrap(), ImageFormat::Jpeg);
    let decoded = image::load_from_memory(&encoded.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (20, 20));
}

// =========================================================================
// Files
// =========================================================================

#[test]
fn to_file_appends_the_output_extension() {
    let tmp = TempDir::new().unwrap();
    let written = Thumbnails::of_images([quadrants(40, 40)])
        .unwrap()
        .size(16, 16)
        .unwrap()
        .output_format("jpeg")
        .unwrap()
        .to_file(tmp.path().join("nested/thumb.png"))
        .unwrap();

    assert_eq!(written, tmp.path().join("nested/thumb.png.jpg"));
    let bytes = fs::read(&written).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
}

#[test]
fn existing_destination_is_kept_without_overwrite() {
    let tmp = TempDir::new().unwrap();
    let destination = tmp.path().join("thumb.png");
    fs::write(&destination, b"keep me").unwrap();

    let result = Thumbnails::of_images([quadrants(40, 40)])
        .unwrap()
        .size(16, 16)
        .unwrap()
        .output_format("png")
        .unwrap()
        .allow_overwrite(false)
        .unwrap()
        .to_file(&destination);

    assert!(matches!(result, Err(ThumbnailError::DestinationExists(ref p)) if p == &destination));
    assert_eq!(fs::read(&destination).unwrap(), b"keep me");
}

#[test]
fn existing_destination_is_replaced_by_default() {
    let tmp = TempDir::new().unwrap();
    let destination = tmp.path().join("thumb.png");
    fs::write(&destination, b"old").unwrap();

    Thumbnails::of_images([quadrants(40, 40)])
        .unwrap()
        .size(16, 16)
        .unwrap()
        .output_format("png")
        .unwrap()
        .to_file(&destination)
        .unwrap();
    let bytes = fs::read(&destination).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
}

fn write_inputs(dir: &Path) -> Vec<std::path::PathBuf> {
    let paths = vec![dir.join("a.png"), dir.join("b.png")];
    for path in &paths {
        fs::write(path, png_bytes(&quadrants(30, 20))).unwrap();
    }
    paths
}

#[test]
fn to_dir_renames_each_input() {
    let tmp = TempDir::new().unwrap();
    let inputs = write_inputs(tmp.path());
    let out = tmp.path().join("thumbs");

    let outcomes = Thumbnails::of_paths(inputs)
        .unwrap()
        .width(15)
        .unwrap()
        .to_dir(&out, &Renames::SuffixHyphenThumbnail)
        .unwrap();

    let written: Vec<_> = outcomes
        .into_iter()
        .map(|o| o.result.unwrap())
        .collect();
    assert_eq!(
        written,
        vec![out.join("a-thumbnail.png"), out.join("b-thumbnail.png")]
    );
    let thumb = image::open(&written[0]).unwrap();
    assert_eq!(thumb.dimensions(), (15, 10));
}

#[test]
fn as_files_writes_next_to_inputs() {
    let tmp = TempDir::new().unwrap();
    let inputs = write_inputs(tmp.path());

    let outcomes = Thumbnails::of_paths(inputs)
        .unwrap()
        .height(10)
        .unwrap()
        .as_files(&Renames::PrefixDotThumbnail)
        .unwrap();

    assert!(outcomes.iter().all(|o| o.is_ok()));
    assert!(tmp.path().join("thumbnail.a.png").is_file());
    assert!(tmp.path().join("thumbnail.b.png").is_file());
}

// =========================================================================
// Recipes
// =========================================================================

#[test]
fn recipe_drives_a_batch() {
    let tmp = TempDir::new().unwrap();
    let inputs = write_inputs(tmp.path());
    fs::write(
        tmp.path().join("logo.png"),
        png_bytes(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, RED))),
    )
    .unwrap();

    let recipe = parse_recipe(
        r#"
size = [12, 12]
crop = "center"
output_format = "png"

[[watermarks]]
image = "logo.png"
position = "top-left"
opacity = 1.0

[output]
rename = "suffix-dot-thumbnail"
"#,
    )
    .unwrap();

    let thumbnails = recipe
        .apply(Thumbnails::of_paths(inputs).unwrap(), tmp.path())
        .unwrap();
    let outcomes = thumbnails
        .to_dir(&tmp.path().join("out"), &recipe.output.rename)
        .unwrap();

    for outcome in &outcomes {
        let path = outcome.result.as_ref().unwrap();
        let thumb = image::open(path).unwrap();
        assert_eq!(thumb.dimensions(), (12, 12));
        assert_eq!(thumb.get_pixel(0, 0), RED);
    }
    assert!(tmp.path().join("out/a.thumbnail.png").is_file());
}
