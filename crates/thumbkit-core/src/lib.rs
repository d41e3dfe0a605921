//! Thumbkit Core - deterministic image transforms
//!
//! This crate resizes images (optionally cropping to an exact size), rotates
//! them losslessly by multiples of 90°, and auto-orients them from their EXIF
//! orientation tag. Pixel work is delegated to a [`Codec`](codec::Codec) and
//! tag access to a [`MetadataStore`](metadata::MetadataStore); the
//! [`Transformer`] sequences the two.
//!
//! # Example
//!
//! ```ignore
//! use thumbkit_core::{init, Config, TransformRequest};
//!
//! let config = Config::default();
//! let runtime = init(config.limits);
//! let transformer = runtime.transformer(config.transform);
//! let result = transformer.transform(&TransformRequest::resize("in.jpg", "out.jpg", 200, 200, true, false))?;
//! println!("{}x{}", result.new_width, result.new_height);
//! ```

use std::path::PathBuf;

pub mod codec;
pub mod config;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod runtime;
pub mod transform;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, ConfigError, DecodeLimits, TransformConfig};
pub use error::{Endpoint, Error};
pub use pipeline::Transformer;
pub use runtime::{init, runtime, Runtime};

/// One transform to perform.
///
/// Construct with [`TransformRequest::resize`], [`TransformRequest::rotate`]
/// or [`TransformRequest::auto_orient`], or fill in the fields directly.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransformRequest {
    /// Target width. Resizing happens only when both targets are positive.
    pub target_cols: Option<u32>,
    /// Target height.
    pub target_rows: Option<u32>,
    /// Crop to exactly the target size instead of fitting inside it.
    #[serde(default)]
    pub crop_to_size: bool,
    /// Clockwise rotation: 0, 90, 180 or 270.
    #[serde(default)]
    pub rotate_degrees: i32,
    /// Derive the rotation from the source's orientation tag.
    #[serde(default)]
    pub auto_orient: bool,
    pub src_path: PathBuf,
    pub dst_path: PathBuf,
}

impl TransformRequest {
    /// Resize toward `cols`x`rows`, optionally cropping and auto-orienting.
    pub fn resize(
        src_path: impl Into<PathBuf>,
        dst_path: impl Into<PathBuf>,
        cols: u32,
        rows: u32,
        crop_to_size: bool,
        auto_orient: bool,
    ) -> Self {
        Self {
            target_cols: Some(cols),
            target_rows: Some(rows),
            crop_to_size,
            rotate_degrees: 0,
            auto_orient,
            src_path: src_path.into(),
            dst_path: dst_path.into(),
        }
    }

    /// Rotate clockwise by `degrees`.
    pub fn rotate(src_path: impl Into<PathBuf>, dst_path: impl Into<PathBuf>, degrees: i32) -> Self {
        Self {
            target_cols: None,
            target_rows: None,
            crop_to_size: false,
            rotate_degrees: degrees,
            auto_orient: false,
            src_path: src_path.into(),
            dst_path: dst_path.into(),
        }
    }

    /// Rotate as the source's orientation tag asks, then mark it upright.
    pub fn auto_orient(src_path: impl Into<PathBuf>, dst_path: impl Into<PathBuf>) -> Self {
        Self {
            auto_orient: true,
            ..Self::rotate(src_path, dst_path, 0)
        }
    }

    /// The resize target, when both dimensions are positive.
    pub fn target(&self) -> Option<(u32, u32)> {
        match (self.target_cols, self.target_rows) {
            (Some(cols), Some(rows)) if cols > 0 && rows > 0 => Some((cols, rows)),
            _ => None,
        }
    }
}

/// Size of the written image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransformResult {
    pub new_width: u32,
    pub new_height: u32,
}

/// Format and size of an image, read from its header.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageInfo {
    /// Lowercase format name, e.g. `jpeg`.
    pub format: String,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for ImageInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}x{}", self.format, self.width, self.height)
    }
}
