//! [`Codec`] implementation backed by the `image` crate.

use std::fs::File;
use std::io::{BufReader, Cursor, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use super::encode::{attach_exif, encode, extract_exif};
use super::shrink::box_shrink;
use super::{
    Area, Codec, CodecError, DestOptions, FormatTag, ImageHandle, Rotation, SourceOptions,
};
use crate::config::DecodeLimits;

/// A decoded image plus the EXIF block carried over from its source.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: DynamicImage,
    exif: Option<Bytes>,
}

impl RasterImage {
    pub fn new(pixels: DynamicImage) -> Self {
        Self { pixels, exif: None }
    }

    /// Attach a raw EXIF (TIFF) block to be written with the image.
    pub fn with_exif(mut self, exif: Bytes) -> Self {
        self.exif = Some(exif);
        self
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn exif(&self) -> Option<&Bytes> {
        self.exif.as_ref()
    }

    fn map(self, f: impl FnOnce(&DynamicImage) -> DynamicImage) -> Self {
        Self {
            pixels: f(&self.pixels),
            exif: self.exif,
        }
    }
}

impl ImageHandle for RasterImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.pixels.width(), self.pixels.height())
    }
}

/// An opened destination file.
#[derive(Debug)]
pub struct RasterSink {
    file: File,
    path: PathBuf,
    format: FormatTag,
    quality: Option<u8>,
}

impl RasterSink {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Codec that decodes and encodes with the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct RasterCodec {
    limits: DecodeLimits,
}

impl RasterCodec {
    pub fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    fn reader(&self, path: &Path) -> Result<ImageReader<BufReader<File>>, CodecError> {
        // Sniff the content; the extension is not trusted.
        let file = BufReader::new(File::open(path)?);
        let mut reader = ImageReader::new(file).with_guessed_format()?;
        reader.limits(self.limits.to_image_limits());
        Ok(reader)
    }
}

/// Axis length after scaling by `scale`, rounded up so that a length that
/// lands a hair under an integer keeps that integer.
#[inline]
pub(crate) fn scaled_len(len: u32, scale: f64) -> u32 {
    ((len as f64 * scale) - 1e-6).ceil().max(1.0) as u32
}

impl Codec for RasterCodec {
    type Image = RasterImage;
    type Sink = RasterSink;

    fn probe_format(&self, path: &Path) -> Result<FormatTag, CodecError> {
        let reader = self.reader(path)?;
        Ok(reader
            .format()
            .map(FormatTag::from_image_format)
            .unwrap_or_else(|| FormatTag::Other("unknown".to_string())))
    }

    fn header_dimensions(&self, path: &Path) -> Result<(u32, u32), CodecError> {
        Ok(self.reader(path)?.into_dimensions()?)
    }

    fn open_read(&self, source: &SourceOptions) -> Result<RasterImage, CodecError> {
        let bytes = Bytes::from(std::fs::read(&source.path)?);

        let mut reader = ImageReader::new(Cursor::new(&bytes[..])).with_guessed_format()?;
        reader.limits(self.limits.to_image_limits());
        let format = reader.format().map(FormatTag::from_image_format);
        let mut pixels = reader.decode()?;

        // Metadata carry-over is best effort; the pixels are what matter here.
        let exif = match format {
            Some(format) => extract_exif(bytes, &format).unwrap_or_else(|e| {
                tracing::warn!(path = %source.path.display(), error = %e, "Dropping unreadable EXIF block");
                None
            }),
            None => None,
        };

        if source.load_shrink > 1 {
            pixels = box_shrink(&pixels, source.load_shrink, source.load_shrink);
        }

        tracing::debug!(
            source = %source,
            width = pixels.width(),
            height = pixels.height(),
            has_exif = exif.is_some(),
            "Opened source image"
        );

        Ok(RasterImage { pixels, exif })
    }

    fn open_write(&self, dest: &DestOptions) -> Result<RasterSink, CodecError> {
        if !dest.format.is_supported() {
            return Err(CodecError::UnsupportedOutput(dest.format.to_string()));
        }
        let file = File::create(&dest.path)?;
        Ok(RasterSink {
            file,
            path: dest.path.clone(),
            format: dest.format.clone(),
            quality: dest.quality,
        })
    }

    fn shrink(
        &self,
        image: RasterImage,
        x_factor: u32,
        y_factor: u32,
    ) -> Result<RasterImage, CodecError> {
        if x_factor == 0 || y_factor == 0 {
            return Err(CodecError::InvalidScale(format!(
                "shrink factors must be positive, got {}x{}",
                x_factor, y_factor
            )));
        }
        Ok(image.map(|pixels| box_shrink(pixels, x_factor, y_factor)))
    }

    fn affine_bilinear(
        &self,
        image: RasterImage,
        x_scale: f64,
        y_scale: f64,
    ) -> Result<RasterImage, CodecError> {
        let valid = |s: f64| s.is_finite() && s > 0.0 && s <= 1.0;
        if !valid(x_scale) || !valid(y_scale) {
            return Err(CodecError::InvalidScale(format!(
                "affine scales must be in (0, 1], got {}x{}",
                x_scale, y_scale
            )));
        }

        let (width, height) = image.dimensions();
        let new_width = scaled_len(width, x_scale);
        let new_height = scaled_len(height, y_scale);
        Ok(image.map(|pixels| pixels.resize_exact(new_width, new_height, FilterType::Triangle)))
    }

    fn extract_area(&self, image: RasterImage, area: Area) -> Result<RasterImage, CodecError> {
        let (image_width, image_height) = image.dimensions();
        let fits = |start: u32, len: u32, limit: u32| {
            len > 0 && start.checked_add(len).is_some_and(|end| end <= limit)
        };
        if !fits(area.left, area.width, image_width) || !fits(area.top, area.height, image_height)
        {
            return Err(CodecError::AreaOutOfBounds {
                left: area.left,
                top: area.top,
                width: area.width,
                height: area.height,
                image_width,
                image_height,
            });
        }

        Ok(image.map(|pixels| pixels.crop_imm(area.left, area.top, area.width, area.height)))
    }

    fn rotate(&self, image: RasterImage, rotation: Rotation) -> Result<RasterImage, CodecError> {
        Ok(image.map(|pixels| match rotation {
            Rotation::Deg90 => pixels.rotate90(),
            Rotation::Deg180 => pixels.rotate180(),
            Rotation::Deg270 => pixels.rotate270(),
        }))
    }

    fn write(&self, image: &RasterImage, sink: RasterSink) -> Result<(), CodecError> {
        let mut encoded = encode(&image.pixels, &sink.format, sink.quality)?;
        if let Some(exif) = &image.exif {
            encoded = attach_exif(encoded, &sink.format, exif.clone())?;
        }

        let mut file = sink.file;
        file.write_all(&encoded)?;
        file.flush()?;

        tracing::debug!(
            path = %sink.path.display(),
            format = %sink.format,
            bytes = encoded.len(),
            "Wrote destination image"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn test_image(width: u32, height: u32) -> RasterImage {
        RasterImage::new(DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        })))
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        test_image(width, height).pixels.save(&path).unwrap();
        path
    }

    #[test]
    fn test_scaled_len() {
        assert_eq!(scaled_len(174, 1.0), 174);
        assert_eq!(scaled_len(333, 0.9), 300);
        assert_eq!(scaled_len(250, 0.9), 225);
        assert_eq!(scaled_len(1, 0.01), 1);
    }

    #[test]
    fn test_probe_format_sniffs_content() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(dir.path(), "image.png", 4, 4);
        let codec = RasterCodec::default();
        assert_eq!(codec.probe_format(&png).unwrap(), FormatTag::Png);

        // Misleading extension: the content wins
        let renamed = dir.path().join("image.jpg");
        std::fs::copy(&png, &renamed).unwrap();
        assert_eq!(codec.probe_format(&renamed).unwrap(), FormatTag::Png);

        let bmp = dir.path().join("image.bmp");
        std::fs::write(&bmp, b"BM\x00\x00\x00\x00\x00\x00\x00\x00").unwrap();
        assert!(!codec.probe_format(&bmp).unwrap().is_supported());
    }

    #[test]
    fn test_probe_missing_file() {
        let codec = RasterCodec::default();
        let result = codec.probe_format(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(CodecError::Io(_))));
    }

    #[test]
    fn test_header_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(dir.path(), "image.png", 40, 30);
        let codec = RasterCodec::default();
        assert_eq!(codec.header_dimensions(&png).unwrap(), (40, 30));
    }

    #[test]
    fn test_open_read_with_load_shrink() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(dir.path(), "image.png", 40, 30);
        let codec = RasterCodec::default();

        let mut options = SourceOptions::new(&png);
        assert_eq!(codec.open_read(&options).unwrap().dimensions(), (40, 30));

        options.load_shrink = 4;
        assert_eq!(codec.open_read(&options).unwrap().dimensions(), (10, 7));
    }

    #[test]
    fn test_decode_limits_are_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(dir.path(), "image.png", 40, 30);
        let codec = RasterCodec::new(DecodeLimits {
            max_width: 20,
            ..DecodeLimits::default()
        });
        assert!(codec.open_read(&SourceOptions::new(&png)).is_err());
    }

    #[test]
    fn test_shrink_and_affine() {
        let codec = RasterCodec::default();
        let img = codec.shrink(test_image(800, 600), 3, 3).unwrap();
        assert_eq!(img.dimensions(), (266, 200));

        let img = codec.affine_bilinear(img, 0.5, 0.5).unwrap();
        assert_eq!(img.dimensions(), (133, 100));
    }

    #[test]
    fn test_invalid_scales() {
        let codec = RasterCodec::default();
        assert!(codec.shrink(test_image(4, 4), 0, 1).is_err());
        assert!(codec.affine_bilinear(test_image(4, 4), 0.0, 1.0).is_err());
        assert!(codec.affine_bilinear(test_image(4, 4), 1.5, 1.0).is_err());
        assert!(codec.affine_bilinear(test_image(4, 4), f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_extract_area() {
        let codec = RasterCodec::default();
        let area = Area {
            left: 1,
            top: 0,
            width: 100,
            height: 50,
        };
        let img = codec.extract_area(test_image(101, 50), area).unwrap();
        assert_eq!(img.dimensions(), (100, 50));
        // First column now holds what was column 1
        assert_eq!(img.pixels().to_rgb8().get_pixel(0, 0).0, [1, 0, 64]);
    }

    #[test]
    fn test_extract_area_out_of_bounds() {
        let codec = RasterCodec::default();
        let area = Area {
            left: 2,
            top: 0,
            width: 100,
            height: 50,
        };
        let result = codec.extract_area(test_image(101, 50), area);
        assert!(matches!(result, Err(CodecError::AreaOutOfBounds { .. })));
        assert!(result.unwrap_err().to_string().contains("101x50"));
    }

    #[test]
    fn test_rotate_four_times_restores_dimensions() {
        let codec = RasterCodec::default();
        let mut img = test_image(30, 20);
        for _ in 0..4 {
            img = codec.rotate(img, Rotation::Deg90).unwrap();
        }
        assert_eq!(img.dimensions(), (30, 20));
    }

    #[test]
    fn test_rotate_carries_exif() {
        let codec = RasterCodec::default();
        let exif = Bytes::from_static(b"II*\x00\x08\x00\x00\x00\x00\x00\x00\x00\x00\x00");
        let img = test_image(3, 2).with_exif(exif.clone());
        let rotated = codec.rotate(img, Rotation::Deg270).unwrap();
        assert_eq!(rotated.dimensions(), (2, 3));
        assert_eq!(rotated.exif(), Some(&exif));
    }

    #[test]
    fn test_open_write_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bmp");
        let dest = DestOptions {
            format: FormatTag::from_extension(&path),
            path: path.clone(),
            quality: None,
        };
        let codec = RasterCodec::default();
        assert!(matches!(codec.open_write(&dest), Err(CodecError::UnsupportedOutput(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let codec = RasterCodec::default();
        let sink = codec
            .open_write(&DestOptions {
                path: path.clone(),
                format: FormatTag::Jpeg,
                quality: Some(90),
            })
            .unwrap();
        assert_eq!(sink.path(), path.as_path());

        codec.write(&test_image(16, 8), sink).unwrap();
        assert_eq!(codec.header_dimensions(&path).unwrap(), (16, 8));
        assert_eq!(codec.probe_format(&path).unwrap(), FormatTag::Jpeg);
    }
}
