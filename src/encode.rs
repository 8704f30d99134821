//! Image encoding for captured frames

use std::fmt;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// Output image container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossless, keeps alpha
    #[default]
    Png,
    /// Lossy, alpha flattened onto white
    Jpeg,
    /// Lossless WebP, keeps alpha
    Webp,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(format!("unsupported image format '{}'", other)),
        }
    }
}

/// Encode an RGBA frame. `quality` (1-100) only affects JPEG.
pub fn encode_rgba(image: &RgbaImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    let (width, height) = image.dimensions();
    match format {
        ImageFormat::Png => {
            PngEncoder::new(&mut buf).write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)?;
        }
        ImageFormat::Jpeg => {
            let flat = flatten_onto_white(image);
            JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).write_image(
                flat.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
        ImageFormat::Webp => {
            WebPEncoder::new_lossless(&mut buf).write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)?;
        }
    }
    Ok(buf)
}

fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_dimensions_survive_encoding() {
        let img = RgbaImage::from_pixel(7, 3, image::Rgba([10, 20, 30, 128]));
        let bytes = encode_rgba(&img, ImageFormat::Png, 90).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 3));
    }

    #[test]
    fn test_jpeg_flattens_transparent_pixels() {
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 0]));
        let bytes = encode_rgba(&img, ImageFormat::Jpeg, 95).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert!(decoded.get_pixel(1, 1).0.iter().all(|&c| c > 240));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JPEG".parse::<ImageFormat>(), Ok(ImageFormat::Jpeg));
        assert_eq!("webp".parse::<ImageFormat>(), Ok(ImageFormat::Webp));
        assert!("tiff".parse::<ImageFormat>().is_err());
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }
}
