//! Integer block-average shrink.
//!
//! Each output pixel is the mean of an `x_factor x y_factor` block of source
//! pixels. Output size is `floor(len / factor)` per axis, never below 1; when
//! a block runs past the source edge only the pixels that exist are averaged.

use image::{DynamicImage, ImageBuffer, Pixel};

/// Channel sample that can be accumulated in `f64`.
trait Sample: Copy {
    fn widen(self) -> f64;
    fn narrow(value: f64) -> Self;
}

impl Sample for u8 {
    fn widen(self) -> f64 {
        self as f64
    }
    fn narrow(value: f64) -> Self {
        value.round().clamp(0.0, u8::MAX as f64) as u8
    }
}

impl Sample for u16 {
    fn widen(self) -> f64 {
        self as f64
    }
    fn narrow(value: f64) -> Self {
        value.round().clamp(0.0, u16::MAX as f64) as u16
    }
}

impl Sample for f32 {
    fn widen(self) -> f64 {
        self as f64
    }
    fn narrow(value: f64) -> Self {
        value as f32
    }
}

/// Output length of one axis after shrinking by `factor`.
#[inline]
pub(crate) fn shrunk_len(len: u32, factor: u32) -> u32 {
    (len / factor.max(1)).max(1)
}

/// Shrink `image` by integer factors. Factors of 1 on both axes return a copy.
pub(crate) fn box_shrink(image: &DynamicImage, x_factor: u32, y_factor: u32) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(average(buf, x_factor, y_factor)),
        DynamicImage::ImageLumaA8(buf) => {
            DynamicImage::ImageLumaA8(average(buf, x_factor, y_factor))
        }
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(average(buf, x_factor, y_factor)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(average(buf, x_factor, y_factor)),
        DynamicImage::ImageLuma16(buf) => {
            DynamicImage::ImageLuma16(average(buf, x_factor, y_factor))
        }
        DynamicImage::ImageLumaA16(buf) => {
            DynamicImage::ImageLumaA16(average(buf, x_factor, y_factor))
        }
        DynamicImage::ImageRgb16(buf) => DynamicImage::ImageRgb16(average(buf, x_factor, y_factor)),
        DynamicImage::ImageRgba16(buf) => {
            DynamicImage::ImageRgba16(average(buf, x_factor, y_factor))
        }
        DynamicImage::ImageRgb32F(buf) => {
            DynamicImage::ImageRgb32F(average(buf, x_factor, y_factor))
        }
        DynamicImage::ImageRgba32F(buf) => {
            DynamicImage::ImageRgba32F(average(buf, x_factor, y_factor))
        }
        other => DynamicImage::ImageRgba8(average(&other.to_rgba8(), x_factor, y_factor)),
    }
}

fn average<P>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    x_factor: u32,
    y_factor: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
    P::Subpixel: Sample,
{
    let (src_w, src_h) = src.dimensions();
    let x_factor = x_factor.max(1);
    let y_factor = y_factor.max(1);
    let out_w = shrunk_len(src_w, x_factor);
    let out_h = shrunk_len(src_h, y_factor);
    let channels = P::CHANNEL_COUNT as usize;

    ImageBuffer::from_fn(out_w, out_h, |ox, oy| {
        let x0 = ox * x_factor;
        let y0 = oy * y_factor;
        let x1 = (x0 + x_factor).min(src_w);
        let y1 = (y0 + y_factor).min(src_h);

        let mut sum = [0.0f64; 4];
        for y in y0..y1 {
            for x in x0..x1 {
                for (c, v) in src.get_pixel(x, y).channels().iter().enumerate() {
                    sum[c] += (*v).widen();
                }
            }
        }

        let count = ((x1 - x0) * (y1 - y0)) as f64;
        let mut out = *src.get_pixel(x0, y0);
        for (c, v) in out.channels_mut().iter_mut().enumerate().take(channels) {
            *v = Sample::narrow(sum[c] / count);
        }
        out
    })
}
