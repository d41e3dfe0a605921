//! Lossless rotation by a multiple of 90 degrees.

use crate::codec::{Codec, Rotation};
use crate::Error;

/// Applies a clockwise rotation through a [`Codec`].
pub struct RotateStage<'a, C> {
    codec: &'a C,
}

impl<'a, C: Codec> RotateStage<'a, C> {
    pub fn new(codec: &'a C) -> Self {
        Self { codec }
    }

    /// Rotate `image` by `degrees`. Zero returns the input handle unchanged.
    pub fn apply(&self, image: C::Image, degrees: i32) -> Result<C::Image, Error> {
        if degrees == 0 {
            return Ok(image);
        }
        let rotation = Rotation::from_degrees(degrees).ok_or_else(|| {
            Error::invalid(format!("rotate must be 0, 90, 180 or 270, got {}", degrees))
        })?;

        tracing::debug!(degrees, "Rotating");
        self.codec
            .rotate(image, rotation)
            .map_err(Error::transform("rotate"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FormatTag, ImageHandle};
    use crate::testing::{MockCodec, MockOp};

    #[test]
    fn test_zero_is_passthrough() {
        let codec = MockCodec::new(FormatTag::Png, 30, 20);
        let image = RotateStage::new(&codec).apply(codec.image((30, 20)), 0).unwrap();
        assert_eq!(image.dimensions(), (30, 20));
        assert!(codec.ops().is_empty());
        assert_eq!(codec.created_images(), 1);
    }

    #[test]
    fn test_quarter_turns_swap_dimensions() {
        let codec = MockCodec::new(FormatTag::Png, 30, 20);
        let stage = RotateStage::new(&codec);
        assert_eq!(stage.apply(codec.image((30, 20)), 90).unwrap().dimensions(), (20, 30));
        assert_eq!(stage.apply(codec.image((30, 20)), 180).unwrap().dimensions(), (30, 20));
        assert_eq!(stage.apply(codec.image((30, 20)), 270).unwrap().dimensions(), (20, 30));
    }

    #[test]
    fn test_four_quarter_turns_restore_dimensions() {
        let codec = MockCodec::new(FormatTag::Png, 30, 20);
        let stage = RotateStage::new(&codec);
        let mut image = codec.image((30, 20));
        for _ in 0..4 {
            image = stage.apply(image, 90).unwrap();
        }
        assert_eq!(image.dimensions(), (30, 20));
        assert_eq!(codec.ops(), vec![MockOp::Rotate(Rotation::Deg90); 4]);
    }

    #[test]
    fn test_invalid_degrees() {
        let codec = MockCodec::new(FormatTag::Png, 30, 20);
        let result = RotateStage::new(&codec).apply(codec.image((30, 20)), 45);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(codec.live_images(), 0);
    }
}
