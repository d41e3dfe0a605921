//! Pixel codec boundary.
//!
//! The transform core never touches pixels directly. It drives a [`Codec`],
//! which decodes, resamples, rotates and encodes on its behalf.
//!
//! # Ownership
//!
//! Every pixel operation consumes its input handle and returns a new one, so
//! each stage exclusively owns the image it produced until it hands it to the
//! next stage. A handle is released when it goes out of scope, which covers
//! early returns and mid-pipeline failures without explicit cleanup calls.
//!
//! # Implementations
//!
//! - [`RasterCodec`]: decodes with the `image` crate and carries the source's
//!   EXIF block through to the encoded destination.

mod encode;
mod raster;
mod shrink;
mod types;

pub use raster::{RasterCodec, RasterImage, RasterSink};
#[cfg(test)]
pub(crate) use raster::scaled_len;
#[cfg(test)]
pub(crate) use shrink::shrunk_len;
pub use types::{Area, CodecError, DestOptions, FormatTag, Rotation, SourceOptions};

use std::path::Path;

/// An opened image whose size can be queried.
pub trait ImageHandle {
    /// Current `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);
}

/// The operations the transform core needs from a pixel library.
pub trait Codec {
    /// Decoded image handle.
    type Image: ImageHandle;
    /// Opened destination, consumed by [`Codec::write`].
    type Sink;

    /// Detect the container format of the file at `path`.
    fn probe_format(&self, path: &Path) -> Result<FormatTag, CodecError>;

    /// Read the image size from the header only.
    fn header_dimensions(&self, path: &Path) -> Result<(u32, u32), CodecError>;

    /// Open and decode a source image.
    fn open_read(&self, source: &SourceOptions) -> Result<Self::Image, CodecError>;

    /// Open a destination for writing.
    fn open_write(&self, dest: &DestOptions) -> Result<Self::Sink, CodecError>;

    /// Block-average shrink by integer factors on each axis.
    fn shrink(&self, image: Self::Image, x_factor: u32, y_factor: u32)
        -> Result<Self::Image, CodecError>;

    /// Bilinear affine scale; both scales are in (0, 1].
    fn affine_bilinear(
        &self,
        image: Self::Image,
        x_scale: f64,
        y_scale: f64,
    ) -> Result<Self::Image, CodecError>;

    /// Cut out a rectangle.
    fn extract_area(&self, image: Self::Image, area: Area) -> Result<Self::Image, CodecError>;

    /// Lossless rotation.
    fn rotate(&self, image: Self::Image, rotation: Rotation) -> Result<Self::Image, CodecError>;

    /// Encode `image` into the destination.
    fn write(&self, image: &Self::Image, sink: Self::Sink) -> Result<(), CodecError>;
}
