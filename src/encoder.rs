//! Cover thumbnail encoding.

use crate::error::Result;
use image::ImageFormat;
use std::path::Path;

/// Output encoding for cover thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CoverFormat {
    /// JPEG output.
    #[default]
    Jpeg,
    /// PNG output.
    Png,
    /// Lossless WebP output.
    Webp,
}

impl CoverFormat {
    /// File extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            CoverFormat::Jpeg => "jpg",
            CoverFormat::Png => "png",
            CoverFormat::Webp => "webp",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            CoverFormat::Jpeg => ImageFormat::Jpeg,
            CoverFormat::Png => ImageFormat::Png,
            CoverFormat::Webp => ImageFormat::WebP,
        }
    }
}

impl std::fmt::Display for CoverFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverFormat::Jpeg => write!(f, "jpeg"),
            CoverFormat::Png => write!(f, "png"),
            CoverFormat::Webp => write!(f, "webp"),
        }
    }
}

/// Capability to turn a raw cover byte stream into an on-disk thumbnail.
pub trait ImageEncoder: Send + Sync {
    /// Decode `data`, shrink it to at most `size` pixels wide, and write it
    /// as `{out_dir}/{out_name}.{ext}`. Returns the final path.
    fn write_cover_thumbnail(
        &self,
        data: &[u8],
        out_name: &str,
        out_dir: &Path,
        format: CoverFormat,
        size: u32,
    ) -> Result<String>;
}

/// Default encoder backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThumbnailEncoder;

impl ImageEncoder for ThumbnailEncoder {
    fn write_cover_thumbnail(
        &self,
        data: &[u8],
        out_name: &str,
        out_dir: &Path,
        format: CoverFormat,
        size: u32,
    ) -> Result<String> {
        let img = image::load_from_memory(data)?;
        let thumb = if img.width() > size {
            img.thumbnail(size, u32::MAX)
        } else {
            img
        };

        std::fs::create_dir_all(out_dir)?;
        let out_path = out_dir.join(format!("{out_name}.{}", format.extension()));
        thumb.save_with_format(&out_path, format.image_format())?;

        tracing::debug!(
            path = %out_path.display(),
            width = thumb.width(),
            height = thumb.height(),
            "Wrote cover thumbnail"
        );
        Ok(out_path.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([8, 8, 8])));
        let mut data = Vec::new();
        img.write_to(&mut Cursor::new(&mut data), ImageFormat::Png).unwrap();
        data
    }

    #[test]
    fn thumbnail_is_bounded_by_width() {
        let dir = TempDir::new().unwrap();
        let path = ThumbnailEncoder
            .write_cover_thumbnail(&png_bytes(400, 600), "v1", dir.path(), CoverFormat::Png, 100)
            .unwrap();

        let written = image::open(&path).unwrap();
        assert_eq!(written.width(), 100);
        assert_eq!(written.height(), 150);
        assert!(path.ends_with("v1.png"));
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let dir = TempDir::new().unwrap();
        let path = ThumbnailEncoder
            .write_cover_thumbnail(&png_bytes(50, 80), "v2", dir.path(), CoverFormat::Jpeg, 320)
            .unwrap();
        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (50, 80));
    }

    #[test]
    fn garbage_bytes_fail_cleanly() {
        let dir = TempDir::new().unwrap();
        let result = ThumbnailEncoder.write_cover_thumbnail(
            b"not an image",
            "v3",
            dir.path(),
            CoverFormat::Jpeg,
            100,
        );
        assert!(result.is_err());
    }
}
