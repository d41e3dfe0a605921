//! Core types shared by codec implementations.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for codec operations.
///
/// The `Display` output is the diagnostic text surfaced to callers.
#[derive(Debug, Error)]
pub enum CodecError {
    /// I/O error while reading or writing an image file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image library failed to decode, resample or encode.
    #[error("{0}")]
    Image(#[from] image::ImageError),

    /// JPEG/PNG container could not be parsed for metadata carry-over.
    #[error("container error: {0}")]
    Container(#[from] img_parts::Error),

    /// The destination extension does not map to a writable format.
    #[error("unsupported output format: {0}")]
    UnsupportedOutput(String),

    /// A requested region does not fit inside the image.
    #[error("area {width}x{height}+{left}+{top} exceeds image bounds {image_width}x{image_height}")]
    AreaOutOfBounds {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    /// Shrink factors must be at least 1 and scales must be in (0, 1].
    #[error("invalid scale: {0}")]
    InvalidScale(String),
}

/// Image container format as detected by probing or by extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatTag {
    Jpeg,
    Png,
    Gif,
    /// Anything else, carrying a short name for diagnostics.
    Other(String),
}

impl FormatTag {
    /// Whether this format is on the source allow-list.
    pub fn is_supported(&self) -> bool {
        matches!(self, FormatTag::Jpeg | FormatTag::Png | FormatTag::Gif)
    }

    /// Map the image crate's format onto a tag.
    pub fn from_image_format(format: image::ImageFormat) -> Self {
        match format {
            image::ImageFormat::Jpeg => FormatTag::Jpeg,
            image::ImageFormat::Png => FormatTag::Png,
            image::ImageFormat::Gif => FormatTag::Gif,
            other => FormatTag::Other(format!("{:?}", other).to_lowercase()),
        }
    }

    /// Guess the format from a path's extension.
    pub fn from_extension(path: &Path) -> Self {
        match image::ImageFormat::from_path(path) {
            Ok(format) => Self::from_image_format(format),
            Err(_) => FormatTag::Other(
                path.extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTag::Jpeg => f.write_str("jpeg"),
            FormatTag::Png => f.write_str("png"),
            FormatTag::Gif => f.write_str("gif"),
            FormatTag::Other(name) => f.write_str(name),
        }
    }
}

/// Lossless clockwise rotation by a multiple of 90 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Map a degree value onto a rotation. Zero and anything that is not
    /// 90, 180 or 270 yields `None`.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// Dimensions of a `width x height` image after this rotation.
    #[inline]
    pub fn rotated_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Rotation::Deg180 => (width, height),
            Rotation::Deg90 | Rotation::Deg270 => (height, width),
        }
    }
}

/// A rectangle inside an image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Area {
    /// Whether this area covers the whole of a `width x height` image.
    pub fn covers(&self, width: u32, height: u32) -> bool {
        self.left == 0 && self.top == 0 && self.width == width && self.height == height
    }
}

/// Decode-side options for opening a source image.
///
/// `load_shrink` is the fast-decode hint: the decoder may deliver the image
/// already reduced by this integer factor (1, 2, 4 or 8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    pub path: PathBuf,
    pub load_shrink: u32,
}

impl SourceOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            load_shrink: 1,
        }
    }
}

/// Renders the historical `path:shrink` syntax.
impl fmt::Display for SourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.load_shrink > 1 {
            write!(f, "{}:{}", self.path.display(), self.load_shrink)
        } else {
            write!(f, "{}", self.path.display())
        }
    }
}

/// Encode-side options for the destination image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestOptions {
    pub path: PathBuf,
    pub format: FormatTag,
    /// JPEG compression quality (1-100).
    pub quality: Option<u8>,
}

/// Renders the historical `path:quality` syntax.
impl fmt::Display for DestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quality {
            Some(quality) => write!(f, "{}:{}", self.path.display(), quality),
            None => write!(f, "{}", self.path.display()),
        }
    }
}
