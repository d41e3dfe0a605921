//! Embedded metadata boundary.
//!
//! The transform core reads and rewrites a single tag, the EXIF orientation,
//! through a [`MetadataStore`]. Parser failures are converted into
//! [`MetadataError`] here and never escape as panics.

mod exif_store;
mod tiff;

pub use exif_store::{ExifDocument, ExifStore};

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from reading or writing embedded metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The JPEG/PNG container could not be parsed.
    #[error("malformed container: {0}")]
    Container(#[from] img_parts::Error),

    /// The EXIF block could not be parsed or serialized.
    #[error("exif error: {0}")]
    Exif(#[from] exif::Error),

    /// The file format cannot hold EXIF data.
    #[error("cannot store EXIF data in {0}")]
    UnsupportedContainer(PathBuf),

    /// The orientation tag holds a value outside `{1, 3, 6, 8}`.
    #[error("unexpected orientation value {0}")]
    UnexpectedOrientation(u32),
}

impl MetadataError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The values stored under one tag. `values.len()` is the tag's count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReading {
    pub values: Vec<u32>,
}

impl TagReading {
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// The value when the tag holds exactly one.
    pub fn single(&self) -> Option<u32> {
        match self.values.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }
}

/// Opens metadata documents for image files.
pub trait MetadataStore {
    type Document: MetadataDocument;

    fn open(&self, path: &Path) -> Result<Self::Document, MetadataError>;
}

/// Metadata of one opened image file.
pub trait MetadataDocument {
    /// Look up a primary-image tag. `None` when absent.
    fn read_tag(&self, tag: exif::Tag) -> Option<TagReading>;

    /// Stage a new single SHORT value for a tag.
    fn set_tag(&mut self, tag: exif::Tag, value: u16);

    /// Write staged changes back to the file.
    fn persist(self) -> Result<(), MetadataError>;
}
