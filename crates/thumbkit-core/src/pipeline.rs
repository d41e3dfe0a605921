//! The transform orchestrator.

use std::path::{Path, PathBuf};

use crate::codec::{Codec, ImageHandle};
use crate::config::{IdleRequestPolicy, TransformConfig};
use crate::error::{Endpoint, Error};
use crate::metadata::MetadataStore;
use crate::transform::{
    Orientation, OrientationResolver, PathOptionEncoder, ResizeCropStage, RotateStage,
};
use crate::{ImageInfo, TransformRequest, TransformResult};

/// Runs [`TransformRequest`]s against a codec and a metadata store.
///
/// A `Transformer` holds no mutable state, so one instance can serve
/// concurrent calls on disjoint source/destination pairs.
#[derive(Debug, Clone)]
pub struct Transformer<C, M> {
    codec: C,
    metadata: M,
    config: TransformConfig,
}

impl<C: Codec, M: MetadataStore> Transformer<C, M> {
    pub fn new(codec: C, metadata: M, config: TransformConfig) -> Self {
        Self {
            codec,
            metadata,
            config,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Perform one transform.
    ///
    /// The source is validated and probed before the destination is touched.
    /// Every image handle opened along the way is released before this
    /// returns, whether it succeeds or not.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for identical paths, rotate combined with
    ///   auto-orient, a rotation other than 0/90/180/270, or nothing to do
    /// - [`Error::UnsupportedFormat`] for a source outside JPEG/PNG/GIF
    /// - [`Error::Open`] when either end cannot be opened
    /// - [`Error::Transform`] when a resize, crop or rotate step fails
    /// - [`Error::Write`] when encoding the destination fails
    /// - [`Error::Metadata`] when the orientation tag cannot be read, or
    ///   cannot be normalized after the image was written
    pub fn transform(&self, request: &TransformRequest) -> Result<TransformResult, Error> {
        let span = tracing::info_span!(
            "transform",
            src = %request.src_path.display(),
            dst = %request.dst_path.display(),
        );
        let _enter = span.enter();

        if same_file(&request.src_path, &request.dst_path) {
            return Err(Error::invalid("source and destination must be different files"));
        }
        if request.auto_orient && request.rotate_degrees != 0 {
            return Err(Error::invalid("can't rotate and auto-orient"));
        }

        let format = self
            .codec
            .probe_format(&request.src_path)
            .map_err(Error::open(Endpoint::Source))?;
        if !format.is_supported() {
            return Err(Error::UnsupportedFormat(format.to_string()));
        }

        let orientation = OrientationResolver::new(&self.metadata, self.config.unknown_orientation);
        let degrees = if request.auto_orient {
            orientation.read_rotation_needed(&request.src_path)?
        } else {
            request.rotate_degrees
        };
        if !matches!(degrees, 0 | 90 | 180 | 270) {
            return Err(Error::invalid(format!(
                "rotate must be 0, 90, 180 or 270, got {}",
                degrees
            )));
        }

        let target = request.target();
        let need_rotate = degrees > 0;
        if target.is_none() && !need_rotate {
            let idle_allowed = request.auto_orient
                && self.config.idle_request == IdleRequestPolicy::AllowAutoOrient;
            if !idle_allowed {
                return Err(Error::invalid("nothing to do"));
            }
            tracing::debug!("Source already upright, copying");
        }

        let options = PathOptionEncoder::new(self.config.jpeg_quality);
        let source = options
            .source_options(
                &self.codec,
                &request.src_path,
                &format,
                target,
                request.crop_to_size,
            )
            .map_err(Error::open(Endpoint::Source))?;
        let image = self
            .codec
            .open_read(&source)
            .map_err(Error::open(Endpoint::Source))?;

        let dest = options.dest_options(&request.dst_path);
        let sink = self
            .codec
            .open_write(&dest)
            .map_err(Error::open(Endpoint::Destination))?;

        let image = match target {
            Some((cols, rows)) => {
                ResizeCropStage::new(&self.codec).apply(image, cols, rows, request.crop_to_size)?
            }
            None => image,
        };
        let image = RotateStage::new(&self.codec).apply(image, degrees)?;

        self.codec.write(&image, sink).map_err(Error::Write)?;
        let (new_width, new_height) = image.dimensions();
        drop(image);

        if request.auto_orient && need_rotate {
            orientation.write_normalized_orientation(&request.dst_path, Orientation::Upright)?;
        }

        tracing::info!(
            source = %source,
            dest = %dest,
            new_width,
            new_height,
            rotated = degrees,
            "Transform complete"
        );
        Ok(TransformResult {
            new_width,
            new_height,
        })
    }

    /// Report the format and size of the image at `path` without decoding
    /// its pixels.
    ///
    /// # Errors
    ///
    /// - [`Error::Open`] when the file cannot be read or its header parsed
    /// - [`Error::UnsupportedFormat`] for a file outside JPEG/PNG/GIF
    pub fn identify(&self, path: &Path) -> Result<ImageInfo, Error> {
        let format = self
            .codec
            .probe_format(path)
            .map_err(Error::open(Endpoint::Source))?;
        if !format.is_supported() {
            return Err(Error::UnsupportedFormat(format.to_string()));
        }
        let (width, height) = self
            .codec
            .header_dimensions(path)
            .map_err(Error::open(Endpoint::Source))?;

        tracing::debug!(path = %path.display(), %format, width, height, "Identified image");
        Ok(ImageInfo {
            format: format.to_string(),
            width,
            height,
        })
    }
}

/// Whether two paths name the same file, looking through `..`, `.` and
/// symlinks where they resolve.
fn same_file(src: &Path, dst: &Path) -> bool {
    if src == dst {
        return true;
    }
    match (std::fs::canonicalize(src), canonical_destination(dst)) {
        (Ok(src), Some(dst)) => src == dst,
        _ => false,
    }
}

/// The destination need not exist yet, so fall back to its canonical
/// parent joined with the file name.
fn canonical_destination(dst: &Path) -> Option<PathBuf> {
    if let Ok(path) = std::fs::canonicalize(dst) {
        return Some(path);
    }
    let name = dst.file_name()?;
    let parent = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::canonicalize(parent).ok().map(|parent| parent.join(name))
}
