//! Receipt image cleanup before OCR: grayscale, contrast stretch, binarize.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use tracing::debug;

use super::OcrError;

/// Maximum accepted upload for a single image.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, OcrError> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(OcrError::Decode("image too large".into()));
    }
    image::load_from_memory(bytes).map_err(|e| OcrError::Decode(e.to_string()))
}

/// Only the formats the OCR engine is fed: PNG and JPEG.
pub fn is_image(bytes: &[u8]) -> bool {
    matches!(
        image::guess_format(bytes),
        Ok(ImageFormat::Png | ImageFormat::Jpeg)
    )
}

/// Linear stretch of the intensity range onto 0..=255.
pub fn stretch_contrast(mut img: GrayImage) -> GrayImage {
    let (min, max) = img
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if max <= min {
        return img;
    }
    let range = (max - min) as u32;
    for p in img.pixels_mut() {
        p[0] = (((p[0] - min) as u32 * 255) / range) as u8;
    }
    img
}

/// Pixels above the mean become white, the rest black.
pub fn threshold_at_mean(mut img: GrayImage) -> GrayImage {
    let count = (img.width() as u64 * img.height() as u64).max(1);
    let sum: u64 = img.pixels().map(|p| p[0] as u64).sum();
    let mean = (sum / count) as u8;
    for p in img.pixels_mut() {
        *p = if p[0] > mean { Luma([255]) } else { Luma([0]) };
    }
    img
}

pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, OcrError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| OcrError::Processing(format!("png encode: {e}")))?;
    Ok(buf.into_inner())
}

/// Full receipt pipeline; returns a binary PNG ready for OCR.
pub fn prepare_receipt(bytes: &[u8]) -> Result<Vec<u8>, OcrError> {
    let img = decode(bytes)?;
    debug!(width = img.width(), height = img.height(), "receipt decoded");
    let gray = img.to_luma8();
    let binary = threshold_at_mean(stretch_contrast(gray));
    encode_png(&DynamicImage::ImageLuma8(binary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> GrayImage {
        GrayImage::from_fn(4, 1, |x, _| Luma([100 + (x as u8) * 10]))
    }

    #[test]
    fn stretch_maps_range_to_full_scale() {
        let out = stretch_contrast(gradient());
        let values: Vec<u8> = out.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0, 85, 170, 255]);
    }

    #[test]
    fn stretch_leaves_flat_image_alone() {
        let flat = GrayImage::from_pixel(2, 2, Luma([42]));
        assert_eq!(stretch_contrast(flat.clone()), flat);
    }

    #[test]
    fn threshold_produces_binary_image() {
        let out = threshold_at_mean(stretch_contrast(gradient()));
        let values: Vec<u8> = out.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }

    #[test]
    fn prepare_receipt_outputs_png() {
        let rgb = DynamicImage::ImageRgb8(image::RgbImage::from_fn(8, 8, |x, y| {
            image::Rgb([(x * 30) as u8, (y * 30) as u8, 128])
        }));
        let png = encode_png(&rgb).unwrap();
        assert!(is_image(&png));
        let out = prepare_receipt(&png).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_luma8();
        assert!(decoded.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn only_png_and_jpeg_count_as_images() {
        assert!(is_image(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10]));
        assert!(!is_image(b"GIF89a\x01\x00\x01\x00"));
        assert!(!is_image(b"BM\x3a\x00\x00\x00"));
        assert!(!is_image(b"RIFF\x24\x00\x00\x00WEBPVP8 "));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode(b"not an image"), Err(OcrError::Decode(_))));
    }
}
