//! Image variation generation
//!
//! Loads a source photo, re-encodes it as the square PNG the variations
//! endpoint expects, and lists the resulting images. Inline (base64) results
//! are written to the output folder.

use crate::ai::{GeneratedImage, ImageVariationService};
use crate::{Error, Result};
use image::ImageFormat;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

pub const SUPPORTED_SIZES: [&str; 3] = ["256x256", "512x512", "1024x1024"];
pub const MAX_VARIATIONS: u32 = 10;

pub struct PhotoGenerator {
    images: Box<dyn ImageVariationService>,
    image_path: PathBuf,
    output_dir: PathBuf,
}

impl PhotoGenerator {
    pub fn new(
        images: Box<dyn ImageVariationService>,
        image_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            images,
            image_path: image_path.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Generate `n` variations of the source image and return one URL or
    /// saved file path per variation.
    pub async fn generate_variations(&self, n: u32, size: &str) -> Result<Vec<String>> {
        validate_request(n, size)?;

        let png = prepare_source_image(&self.image_path)?;
        info!(
            "Requesting {} variation(s) of {} at {}",
            n,
            self.image_path.display(),
            size
        );

        let generated = self.images.create_variations(&png, n, size).await?;

        generated
            .into_iter()
            .enumerate()
            .map(|(i, image)| match image {
                GeneratedImage::Url(url) => Ok(url),
                GeneratedImage::Bytes(bytes) => self.save_variation(i, &bytes),
            })
            .collect()
    }

    fn save_variation(&self, index: usize, bytes: &[u8]) -> Result<String> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("variation_{}_{}.png", index, Uuid::new_v4()));
        fs::write(&path, bytes)?;
        info!("Saved variation to {}", path.display());
        Ok(path.to_string_lossy().to_string())
    }
}

fn validate_request(n: u32, size: &str) -> Result<()> {
    if !(1..=MAX_VARIATIONS).contains(&n) {
        return Err(Error::InvalidArgument(format!(
            "Variation count must be between 1 and {}, got {}",
            MAX_VARIATIONS, n
        )));
    }
    if !SUPPORTED_SIZES.contains(&size) {
        return Err(Error::InvalidArgument(format!(
            "Unsupported image size '{}'. Expected one of: {}",
            size,
            SUPPORTED_SIZES.join(", ")
        )));
    }
    Ok(())
}

/// Load any supported image format and re-encode it as PNG. The source must
/// be square.
pub fn prepare_source_image(path: &Path) -> Result<Vec<u8>> {
    let img = image::open(path)?;
    if img.width() != img.height() {
        return Err(Error::InvalidArgument(format!(
            "Source image must be square, got {}x{}",
            img.width(),
            img.height()
        )));
    }

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockImageVariationClient;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, Rgb([200, 100, 50]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_prepare_source_image_converts_jpeg_to_png() {
        let dir = tempdir().unwrap();
        let path = write_image(dir.path(), "source.jpg", 8, 8);

        let png = prepare_source_image(&path).unwrap();
        assert_eq!(&png[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn test_prepare_source_image_rejects_non_square() {
        let dir = tempdir().unwrap();
        let path = write_image(dir.path(), "wide.png", 8, 4);

        let err = prepare_source_image(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_prepare_source_image_missing_file() {
        let err = prepare_source_image(Path::new("/nonexistent/image_path.jpg")).unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }

    #[test]
    fn test_validate_request() {
        assert!(validate_request(1, "1024x1024").is_ok());
        assert!(validate_request(0, "1024x1024").is_err());
        assert!(validate_request(11, "256x256").is_err());
        assert!(validate_request(1, "640x480").is_err());
    }

    #[tokio::test]
    async fn test_generate_variations_lists_urls() {
        let dir = tempdir().unwrap();
        let source = write_image(dir.path(), "source.png", 4, 4);
        let generator = PhotoGenerator::new(
            Box::new(MockImageVariationClient::new()),
            source,
            dir.path().join("out"),
        );

        let urls = generator.generate_variations(2, "256x256").await.unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].starts_with("https://images.mock/256x256/"));
    }

    #[tokio::test]
    async fn test_generate_variations_saves_inline_images() {
        let dir = tempdir().unwrap();
        let source = write_image(dir.path(), "source.png", 4, 4);
        let output_dir = dir.path().join("out");
        let generator = PhotoGenerator::new(
            Box::new(
                MockImageVariationClient::new().with_image(GeneratedImage::Bytes(vec![1, 2, 3])),
            ),
            source,
            &output_dir,
        );

        let paths = generator.generate_variations(1, "512x512").await.unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with(".png"));
        assert_eq!(fs::read(&paths[0]).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_generate_variations_validates_before_calling_provider() {
        let client = MockImageVariationClient::new();
        let observer = client.clone();
        let generator = PhotoGenerator::new(Box::new(client), "missing.jpg", "out");

        let err = generator.generate_variations(1, "999x999").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(observer.get_call_count(), 0);
    }
}
