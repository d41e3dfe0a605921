//! Codec options for the two ends of a transform.

use std::path::Path;

use crate::codec::{Codec, CodecError, DestOptions, FormatTag, SourceOptions};

use super::ShrinkPlan;

/// Builds [`SourceOptions`] and [`DestOptions`] records.
#[derive(Debug, Clone, Copy)]
pub struct PathOptionEncoder {
    jpeg_quality: u8,
}

impl PathOptionEncoder {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    /// Options for opening the source.
    ///
    /// A JPEG source being resized toward `target` gets a load-shrink hint:
    /// the planned box-shrink factor, rounded down to 1, 2, 4 or 8. Only the
    /// header is read to plan it. Other formats open as-is.
    pub fn source_options<C: Codec>(
        &self,
        codec: &C,
        path: &Path,
        format: &FormatTag,
        target: Option<(u32, u32)>,
        crop: bool,
    ) -> Result<SourceOptions, CodecError> {
        let mut options = SourceOptions::new(path);
        let (FormatTag::Jpeg, Some((dst_width, dst_height))) = (format, target) else {
            return Ok(options);
        };

        let (width, height) = codec.header_dimensions(path)?;
        let plan = ShrinkPlan::compute(width, height, dst_width, dst_height, crop);
        options.load_shrink = load_shrink_granule(plan.factor);
        Ok(options)
    }

    /// Options for the destination. The format follows the extension and
    /// JPEG destinations carry the configured quality.
    pub fn dest_options(&self, path: &Path) -> DestOptions {
        let format = FormatTag::from_extension(path);
        let quality = (format == FormatTag::Jpeg).then_some(self.jpeg_quality);
        DestOptions {
            path: path.to_path_buf(),
            format,
            quality,
        }
    }
}

/// Round a shrink factor down to a granularity the decoder supports.
fn load_shrink_granule(factor: u32) -> u32 {
    match factor {
        8.. => 8,
        4..=7 => 4,
        2..=3 => 2,
        _ => 1,
    }
}
