//! EXIF orientation handling for auto-orient.
//!
//! Only the four pure rotations are recognized. Mirrored orientations
//! (2, 4, 5, 7) and anything else count as unknown and fall under the
//! [`UnknownOrientationPolicy`].

use std::path::Path;

use exif::Tag;

use crate::config::UnknownOrientationPolicy;
use crate::metadata::{MetadataDocument, MetadataError, MetadataStore};
use crate::Error;

/// A recognized orientation tag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Raw value 1.
    Upright,
    /// Raw value 3.
    Rotated180,
    /// Raw value 6: the stored pixels need a 90° clockwise turn.
    Rotated90,
    /// Raw value 8: the stored pixels need a 270° clockwise turn.
    Rotated270,
}

impl Orientation {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Orientation::Upright),
            3 => Some(Orientation::Rotated180),
            6 => Some(Orientation::Rotated90),
            8 => Some(Orientation::Rotated270),
            _ => None,
        }
    }

    pub fn raw(self) -> u16 {
        match self {
            Orientation::Upright => 1,
            Orientation::Rotated180 => 3,
            Orientation::Rotated90 => 6,
            Orientation::Rotated270 => 8,
        }
    }

    /// Clockwise degrees that bring the image upright.
    pub fn rotation_degrees(self) -> i32 {
        match self {
            Orientation::Upright => 0,
            Orientation::Rotated180 => 180,
            Orientation::Rotated90 => 90,
            Orientation::Rotated270 => 270,
        }
    }
}

/// Reads the rotation an image needs and normalizes the tag afterward.
pub struct OrientationResolver<'a, M> {
    store: &'a M,
    policy: UnknownOrientationPolicy,
}

impl<'a, M: MetadataStore> OrientationResolver<'a, M> {
    pub fn new(store: &'a M, policy: UnknownOrientationPolicy) -> Self {
        Self { store, policy }
    }

    /// Degrees of clockwise rotation the image at `path` needs.
    ///
    /// A missing tag, or one holding other than exactly one value, needs no
    /// rotation. Failing to open or parse the metadata is an error.
    pub fn read_rotation_needed(&self, path: &Path) -> Result<i32, Error> {
        let document = self.store.open(path)?;
        let Some(reading) = document.read_tag(Tag::Orientation) else {
            tracing::debug!(path = %path.display(), "No orientation tag");
            return Ok(0);
        };
        let Some(raw) = reading.single() else {
            tracing::debug!(
                path = %path.display(),
                count = reading.count(),
                "Orientation tag does not hold a single value"
            );
            return Ok(0);
        };

        match Orientation::from_raw(raw) {
            Some(orientation) => {
                tracing::debug!(path = %path.display(), raw, "Read orientation");
                Ok(orientation.rotation_degrees())
            }
            None => match self.policy {
                UnknownOrientationPolicy::Ignore => {
                    tracing::warn!(path = %path.display(), raw, "Ignoring unexpected orientation value");
                    Ok(0)
                }
                UnknownOrientationPolicy::Reject => {
                    Err(MetadataError::UnexpectedOrientation(raw).into())
                }
            },
        }
    }

    /// Set the orientation tag of the already written image at `path`.
    pub fn write_normalized_orientation(
        &self,
        path: &Path,
        orientation: Orientation,
    ) -> Result<(), Error> {
        let mut document = self.store.open(path)?;
        document.set_tag(Tag::Orientation, orientation.raw());
        document.persist()?;
        tracing::debug!(path = %path.display(), raw = orientation.raw(), "Normalized orientation");
        Ok(())
    }
}
