//! Resized derivatives of stored originals.

use bytes::Bytes;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

use crate::blob::{BlobRef, BlobStore};
use crate::config::{DerivativeSpec, LimitsConfig};
use crate::error::{PipelineError, PipelineResult};

/// Produces resized copies of an original and writes them to the blob store.
pub struct DerivativeGenerator {
    limits: LimitsConfig,
}

impl DerivativeGenerator {
    /// Create a new generator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Derive one variant of `source` fitting inside `spec`'s box.
    ///
    /// The result is written to `<spec.dir>/<source file name>`. Decoding and
    /// encoding run on the blocking pool.
    pub async fn derive(
        &self,
        blobs: &dyn BlobStore,
        source: &BlobRef,
        spec: &DerivativeSpec,
    ) -> PipelineResult<BlobRef> {
        let target = source.sibling_in(&spec.dir);
        let fail = |message: String| PipelineError::Derivation {
            source_ref: source.clone(),
            target: target.to_string(),
            message,
        };

        let bytes = blobs
            .read(source)
            .await
            .map_err(|e| fail(format!("cannot read source: {e}")))?;

        let preferred = target
            .extension()
            .and_then(|ext| ImageFormat::from_extension(&ext));
        let (width, height) = (spec.width, spec.height);
        let max_dim = self.limits.max_image_dimension;

        let encoded = tokio::task::spawn_blocking(move || {
            Self::resize_sync(&bytes, preferred, width, height, max_dim)
        })
        .await
        .map_err(|e| fail(format!("task join error: {e}")))?
        .map_err(fail)?;

        blobs
            .put(&target, Bytes::from(encoded))
            .await
            .map_err(|e| fail(format!("cannot write derivative: {e}")))?;

        Ok(target)
    }

    /// Decode, shrink into the box and re-encode (runs in spawn_blocking).
    fn resize_sync(
        bytes: &[u8],
        preferred: Option<ImageFormat>,
        width: u32,
        height: u32,
        max_dim: u32,
    ) -> Result<Vec<u8>, String> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| format!("cannot detect image format: {e}"))?;
        let detected = reader.format();
        let format = preferred
            .or(detected)
            .ok_or_else(|| "unsupported image format".to_string())?;

        let image = reader.decode().map_err(|e| e.to_string())?;
        let (w, h) = image.dimensions();
        if w > max_dim || h > max_dim {
            return Err(format!("image too large ({w}x{h} > {max_dim})"));
        }

        let resized = encodable(fit_within(image, width, height), format);

        let mut buffer = Cursor::new(Vec::new());
        resized
            .write_to(&mut buffer, format)
            .map_err(|e| format!("cannot encode {format:?}: {e}"))?;
        Ok(buffer.into_inner())
    }
}

/// Convert to a pixel layout the target encoder accepts.
///
/// JPEG takes 8-bit RGB only. The other encoders reject 16-bit and float
/// buffers, so those drop to 8 bits while keeping alpha.
fn encodable(image: DynamicImage, format: ImageFormat) -> DynamicImage {
    match (format, image.color()) {
        (ImageFormat::Jpeg, ColorType::Rgb8 | ColorType::L8) => image,
        (ImageFormat::Jpeg, _) => DynamicImage::ImageRgb8(image.to_rgb8()),
        (_, ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8) => image,
        (_, color) if color.has_alpha() => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

/// Shrink preserving aspect ratio so both sides fit the box. Never upscales.
pub fn fit_within(image: DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (w, h) = image.dimensions();
    if w <= width && h <= height {
        image
    } else {
        image.thumbnail(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::LocalBlobStore;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        let img = DynamicImage::new_rgb8(1000, 500);
        let out = fit_within(img, 300, 300);
        assert_eq!(out.dimensions(), (300, 150));

        let tall = DynamicImage::new_rgb8(600, 1200);
        let out = fit_within(tall, 720, 480);
        assert_eq!(out.dimensions(), (240, 480));
    }

    #[test]
    fn test_fit_within_never_upscales() {
        let img = DynamicImage::new_rgb8(100, 80);
        let out = fit_within(img, 300, 300);
        assert_eq!(out.dimensions(), (100, 80));
    }

    #[test]
    fn test_resize_sync_rejects_corrupt_bytes() {
        let corrupt = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x01, 0x02, 0x03];
        let result = DerivativeGenerator::resize_sync(&corrupt, None, 300, 300, 10000);
        assert!(result.is_err());
    }

    #[test]
    fn test_resize_sync_enforces_max_dimension() {
        let bytes = png_bytes(64, 32);
        let err =
            DerivativeGenerator::resize_sync(&bytes, Some(ImageFormat::Png), 300, 300, 50)
                .unwrap_err();
        assert!(err.contains("too large"));
    }

    #[tokio::test]
    async fn test_derive_writes_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "original");
        let source = store
            .store(Bytes::from(png_bytes(900, 600)), "shot.png")
            .await
            .unwrap();

        let generator = DerivativeGenerator::new(LimitsConfig::default());
        let spec = DerivativeSpec::new("img", 720, 480);
        let derived = generator.derive(&store, &source, &spec).await.unwrap();

        assert_eq!(derived, source.sibling_in("img"));
        let bytes = store.read(&derived).await.unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (720, 480));
    }

    #[test]
    fn test_encodable_drops_to_eight_bits() {
        let deep = DynamicImage::new_rgba16(4, 4);
        assert_eq!(encodable(deep.clone(), ImageFormat::WebP).color(), ColorType::Rgba8);
        assert_eq!(encodable(deep, ImageFormat::Jpeg).color(), ColorType::Rgb8);

        let plain = DynamicImage::new_rgb8(4, 4);
        assert_eq!(encodable(plain, ImageFormat::Png).color(), ColorType::Rgb8);
    }

    #[tokio::test]
    async fn test_derive_sixteen_bit_png_named_webp() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "original");
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::new_rgba16(500, 400)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        let source = store
            .store(Bytes::from(buffer.into_inner()), "deep.webp")
            .await
            .unwrap();

        let generator = DerivativeGenerator::new(LimitsConfig::default());
        let spec = DerivativeSpec::new("thumb", 300, 300);
        let derived = generator.derive(&store, &source, &spec).await.unwrap();

        let bytes = store.read(&derived).await.unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::WebP);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (300, 240));
    }

    #[tokio::test]
    async fn test_derive_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "original");
        let generator = DerivativeGenerator::new(LimitsConfig::default());
        let spec = DerivativeSpec::new("thumb", 300, 300);

        let err = generator
            .derive(&store, &BlobRef::new("original/missing.png"), &spec)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Derivation { .. }));
    }
}
