use crate::models::capture_types::Orientation;
use image::DynamicImage;
use std::io::Cursor;

/// Reads the EXIF orientation tag from encoded image bytes, defaulting to `Up`.
///
/// The whole buffer is scanned: WebP and PNG store EXIF after the pixel data.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(e) => e,
        Err(_) => return Orientation::Up,
    };

    match exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) {
        Some(field) => match field.value {
            exif::Value::Short(ref v) => Orientation::from_exif(*v.first().unwrap_or(&1) as u32),
            exif::Value::Long(ref v) => Orientation::from_exif(*v.first().unwrap_or(&1)),
            _ => Orientation::Up,
        },
        None => Orientation::Up,
    }
}

/// Rotates/flips the stored pixels so the result is displayed upright.
pub fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Up => img,
        Orientation::UpMirrored => img.fliph(),
        Orientation::Down => img.rotate180(),
        Orientation::DownMirrored => img.flipv(),
        // transpose
        Orientation::LeftMirrored => img.rotate90().fliph(),
        Orientation::Right => img.rotate90(),
        // transverse
        Orientation::RightMirrored => img.rotate270().fliph(),
        Orientation::Left => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encoded_with_orientation, noise_image};
    use image::{ImageFormat, Rgb, RgbImage};

    const LARGE: usize = 128 * 1024;

    // 3x2 image with a single red marker in the top-left corner.
    fn marked() -> DynamicImage {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    fn marker_position(img: &DynamicImage) -> (u32, u32) {
        let rgb = img.to_rgb8();
        let (x, y, _) = rgb
            .enumerate_pixels()
            .find(|(_, _, p)| p.0 == [255, 0, 0])
            .unwrap();
        (x, y)
    }

    #[test]
    fn bytes_without_exif_are_upright() {
        let mut png = Vec::new();
        marked()
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(read_orientation(&png), Orientation::Up);
        assert_eq!(read_orientation(&[]), Orientation::Up);
        assert_eq!(read_orientation(b"not an image"), Orientation::Up);
    }

    #[test]
    fn mirrored_and_half_turns_keep_dimensions() {
        for (orientation, expected) in [
            (Orientation::Up, (0, 0)),
            (Orientation::UpMirrored, (2, 0)),
            (Orientation::Down, (2, 1)),
            (Orientation::DownMirrored, (0, 1)),
        ] {
            let out = apply_orientation(marked(), orientation);
            assert_eq!((out.width(), out.height()), (3, 2), "{:?}", orientation);
            assert_eq!(marker_position(&out), expected, "{:?}", orientation);
        }
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        for (orientation, expected) in [
            (Orientation::LeftMirrored, (0, 0)),
            (Orientation::Right, (1, 0)),
            (Orientation::RightMirrored, (1, 2)),
            (Orientation::Left, (0, 2)),
        ] {
            let out = apply_orientation(marked(), orientation);
            assert_eq!((out.width(), out.height()), (2, 3), "{:?}", orientation);
            assert_eq!(marker_position(&out), expected, "{:?}", orientation);
        }
    }

    #[test]
    fn jpeg_orientation_tag_is_read() {
        let small = encoded_with_orientation(&marked(), ImageFormat::Jpeg, 6);
        assert_eq!(read_orientation(&small), Orientation::Right);

        let large = encoded_with_orientation(&noise_image(640, 480), ImageFormat::Jpeg, 8);
        assert!(large.len() > LARGE, "jpeg fixture is only {} bytes", large.len());
        assert_eq!(read_orientation(&large), Orientation::Left);
    }

    #[test]
    fn webp_orientation_after_pixel_data_is_read() {
        let small = encoded_with_orientation(&marked(), ImageFormat::WebP, 6);
        assert_eq!(read_orientation(&small), Orientation::Right);

        let large = encoded_with_orientation(&noise_image(320, 240), ImageFormat::WebP, 8);
        assert!(large.len() > LARGE, "webp fixture is only {} bytes", large.len());
        let exif_at = large.windows(4).position(|w| w == b"EXIF").unwrap();
        assert!(exif_at > LARGE);
        assert_eq!(read_orientation(&large), Orientation::Left);
    }
}
