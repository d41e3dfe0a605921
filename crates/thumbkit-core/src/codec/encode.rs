//! In-memory encoding for the supported destination formats.
//!
//! JPEG honors a quality setting; PNG and GIF are lossless and ignore it.
//! After encoding, a carried EXIF block is re-attached to JPEG and PNG output.

use bytes::Bytes;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ExtendedColorType, ImageEncoder};
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::ImageEXIF;

use super::{CodecError, FormatTag};

/// JPEG quality used when the destination carries no quality hint.
pub(crate) const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Encode `image` into `format`, returning the file bytes.
pub(crate) fn encode(
    image: &DynamicImage,
    format: &FormatTag,
    quality: Option<u8>,
) -> Result<Vec<u8>, CodecError> {
    match format {
        FormatTag::Jpeg => encode_jpeg(image, quality.unwrap_or(DEFAULT_JPEG_QUALITY)),
        FormatTag::Png => encode_png(image),
        FormatTag::Gif => encode_gif(image),
        FormatTag::Other(name) => Err(CodecError::UnsupportedOutput(name.clone())),
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CodecError> {
    // Clamp quality to valid range (1-100)
    let quality = quality.clamp(1, 100);
    let (width, height) = (image.width(), image.height());

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);

    // JPEG carries neither alpha nor 16-bit samples
    match image {
        DynamicImage::ImageLuma8(gray) => {
            encoder.write_image(gray.as_raw(), width, height, ExtendedColorType::L8)?
        }
        other => {
            let rgb = other.to_rgb8();
            encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)?
        }
    }

    Ok(buffer)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CodecError> {
    let (width, height) = (image.width(), image.height());
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new(&mut buffer);

    match image.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => {
            let rgba = image.to_rgba16();
            let bytes: Vec<u8> = rgba.as_raw().iter().flat_map(|v| v.to_ne_bytes()).collect();
            encoder.write_image(&bytes, width, height, ExtendedColorType::Rgba16)?
        }
        color => encoder.write_image(image.as_bytes(), width, height, color.into())?,
    }

    Ok(buffer)
}

fn encode_gif(image: &DynamicImage) -> Result<Vec<u8>, CodecError> {
    let rgba = image.to_rgba8();
    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buffer);
        encoder.encode(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )?;
    }
    Ok(buffer)
}

/// Extract the raw EXIF (TIFF) block from encoded JPEG or PNG bytes.
///
/// The returned block is copied out so it does not pin the whole file.
pub(crate) fn extract_exif(data: Bytes, format: &FormatTag) -> Result<Option<Bytes>, CodecError> {
    let exif = match format {
        FormatTag::Jpeg => Jpeg::from_bytes(data)?.exif(),
        FormatTag::Png => Png::from_bytes(data)?.exif(),
        _ => None,
    };
    Ok(exif.map(|block| Bytes::copy_from_slice(&block)))
}

/// Attach an EXIF block to encoded JPEG or PNG bytes. Other formats are
/// returned untouched.
pub(crate) fn attach_exif(
    encoded: Vec<u8>,
    format: &FormatTag,
    exif: Bytes,
) -> Result<Vec<u8>, CodecError> {
    match format {
        FormatTag::Jpeg => {
            let mut jpeg = Jpeg::from_bytes(encoded.into())?;
            jpeg.set_exif(Some(exif));
            Ok(jpeg.encoder().bytes().to_vec())
        }
        FormatTag::Png => {
            let mut png = Png::from_bytes(encoded.into())?;
            png.set_exif(Some(exif));
            Ok(png.encoder().bytes().to_vec())
        }
        _ => Ok(encoded),
    }
}
