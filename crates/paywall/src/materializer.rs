use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};

use crate::constants::{DEFAULT_BLUR_SIGMA, DEFAULT_JPEG_QUALITY};
use crate::error::PaywallError;
use crate::tiers::TierLayout;

/// The blur runs on a copy shrunk by this factor and is scaled back up, so
/// the cost stays flat however large the sigma.
const DOWNSCALE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurSettings {
    /// Gaussian sigma in source pixels.
    pub sigma: f32,
    /// JPEG quality of the stored preview, 1-100.
    pub jpeg_quality: u8,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_BLUR_SIGMA,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Derives the public preview of an asset from its original.
///
/// The preview keeps the original's dimensions and overall composition but
/// none of its fine detail.
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    settings: BlurSettings,
}

impl Materializer {
    pub fn new(settings: BlurSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> BlurSettings {
        self.settings
    }

    /// Blur the protected-tier file at `protected` and write the preview to
    /// its mirrored public-tier path, which is returned.
    pub fn materialize(
        &self,
        layout: &TierLayout,
        protected: &Path,
    ) -> Result<std::path::PathBuf, PaywallError> {
        let public = layout.public_path_for(protected)?;
        self.materialize_to(protected, &public)?;
        Ok(public)
    }

    /// Blur `source` and write the preview JPEG to `dest`.
    pub fn materialize_to(&self, source: &Path, dest: &Path) -> Result<(), PaywallError> {
        let bytes = std::fs::read(source).map_err(|e| {
            PaywallError::MaterializationFailed(format!("cannot read {}: {e}", source.display()))
        })?;
        let original = image::load_from_memory(&bytes).map_err(|e| {
            PaywallError::MaterializationFailed(format!(
                "cannot decode {}: {e}",
                source.display()
            ))
        })?;

        let preview = self.blur(&original);
        self.write_jpeg(&preview, dest)?;

        tracing::debug!(
            source = %source.display(),
            dest = %dest.display(),
            width = preview.width(),
            height = preview.height(),
            "preview materialized"
        );
        Ok(())
    }

    /// Blur an image, keeping its dimensions.
    pub fn blur(&self, original: &DynamicImage) -> RgbImage {
        let (width, height) = original.dimensions();
        let small_w = (width / DOWNSCALE).max(1);
        let small_h = (height / DOWNSCALE).max(1);
        let sigma = (self.settings.sigma / DOWNSCALE as f32).max(0.5);

        original
            .resize_exact(small_w, small_h, FilterType::Triangle)
            .blur(sigma)
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgb8()
    }

    fn write_jpeg(&self, preview: &RgbImage, dest: &Path) -> Result<(), PaywallError> {
        let fail = |e: &dyn std::fmt::Display| {
            PaywallError::MaterializationFailed(format!("cannot write {}: {e}", dest.display()))
        };

        let file = File::create(dest).map_err(|e| fail(&e))?;
        let mut writer = BufWriter::new(file);
        let quality = self.settings.jpeg_quality.clamp(1, 100);
        JpegEncoder::new_with_quality(&mut writer, quality)
            .encode_image(preview)
            .map_err(|e| fail(&e))?;
        writer.flush().map_err(|e| fail(&e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiers::Tier;
    use image::{ImageFormat, Rgb};

    /// Sum of absolute luma differences between horizontal and vertical
    /// neighbours; a crude edge detector.
    fn edge_energy(img: &RgbImage) -> u64 {
        let luma = |p: &Rgb<u8>| (p[0] as i64 * 299 + p[1] as i64 * 587 + p[2] as i64 * 114) / 1000;
        let (w, h) = img.dimensions();
        let mut total = 0u64;
        for y in 0..h {
            for x in 0..w {
                let here = luma(img.get_pixel(x, y));
                if x + 1 < w {
                    total += (here - luma(img.get_pixel(x + 1, y))).unsigned_abs();
                }
                if y + 1 < h {
                    total += (here - luma(img.get_pixel(x, y + 1))).unsigned_abs();
                }
            }
        }
        total
    }

    fn checkerboard(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgb([250, 250, 250])
            } else {
                Rgb([5, 5, 5])
            }
        })
    }

    fn setup(width: u32, height: u32) -> (tempfile::TempDir, TierLayout, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let layout = TierLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let protected = layout.path_for(Tier::Protected, "abc123_board.png").unwrap();
        DynamicImage::ImageRgb8(checkerboard(width, height))
            .save_with_format(&protected, ImageFormat::Png)
            .unwrap();
        (dir, layout, protected)
    }

    #[test]
    fn test_preview_keeps_dimensions_and_loses_detail() {
        let (_dir, layout, protected) = setup(96, 64);
        let materializer = Materializer::default();

        let public = materializer.materialize(&layout, &protected).unwrap();
        assert_eq!(public, layout.path_for(Tier::Public, "abc123_board.png").unwrap());

        let bytes = std::fs::read(&public).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);

        let preview = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(preview.dimensions(), (96, 64));

        let before = edge_energy(&checkerboard(96, 64));
        let after = edge_energy(&preview);
        assert!(
            after * 10 < before,
            "preview still too sharp: {after} vs {before}"
        );
    }

    #[test]
    fn test_preview_no_larger_than_detailed_source() {
        let dir = tempfile::tempdir().unwrap();
        let layout = TierLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let protected = layout.path_for(Tier::Protected, "abc123_noise.png").unwrap();

        // xorshift noise: as much detail as a PNG can carry
        let mut state = 0x9e37_79b9u32;
        let noise = RgbImage::from_fn(128, 96, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            Rgb([r, g, b])
        });
        DynamicImage::ImageRgb8(noise)
            .save_with_format(&protected, ImageFormat::Png)
            .unwrap();

        let public = Materializer::default()
            .materialize(&layout, &protected)
            .unwrap();
        let source_len = std::fs::metadata(&protected).unwrap().len();
        let preview_len = std::fs::metadata(&public).unwrap().len();
        assert!(
            preview_len <= source_len,
            "preview {preview_len} bytes, source {source_len} bytes"
        );
    }

    #[test]
    fn test_tiny_image_survives() {
        let (_dir, layout, protected) = setup(3, 2);
        let public = Materializer::default()
            .materialize(&layout, &protected)
            .unwrap();
        let preview = image::load_from_memory(&std::fs::read(public).unwrap()).unwrap();
        assert_eq!(preview.dimensions(), (3, 2));
    }

    #[test]
    fn test_undecodable_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let layout = TierLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let protected = layout.path_for(Tier::Protected, "notes.txt").unwrap();
        std::fs::write(&protected, b"definitely not an image").unwrap();

        let err = Materializer::default()
            .materialize(&layout, &protected)
            .unwrap_err();
        assert!(matches!(err, PaywallError::MaterializationFailed(_)));
        assert!(!layout.path_for(Tier::Public, "notes.txt").unwrap().exists());
    }

    #[test]
    fn test_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let layout = TierLayout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let protected = layout.path_for(Tier::Protected, "gone.png").unwrap();

        assert!(matches!(
            Materializer::default().materialize(&layout, &protected),
            Err(PaywallError::MaterializationFailed(_))
        ));
    }

    #[test]
    fn test_unwritable_destination_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("board.png");
        DynamicImage::ImageRgb8(checkerboard(16, 16))
            .save_with_format(&source, ImageFormat::Png)
            .unwrap();

        let dest = dir.path().join("no-such-dir").join("out.jpg");
        assert!(matches!(
            Materializer::default().materialize_to(&source, &dest),
            Err(PaywallError::MaterializationFailed(_))
        ));
    }
}
