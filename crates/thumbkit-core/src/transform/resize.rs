//! Resize with optional centered crop.

use crate::codec::{Codec, ImageHandle};
use crate::Error;

use super::{centered_area, ShrinkPlan};

/// Shrinks an image toward a target size through a [`Codec`], then
/// optionally crops it to exactly that size.
pub struct ResizeCropStage<'a, C> {
    codec: &'a C,
}

impl<'a, C: Codec> ResizeCropStage<'a, C> {
    pub fn new(codec: &'a C) -> Self {
        Self { codec }
    }

    /// Resize `image` toward `dst_width`x`dst_height`.
    ///
    /// Without `crop` the result fits inside the target and keeps its aspect
    /// ratio. With `crop` it first covers the target, then the centered
    /// target-sized rectangle is kept.
    pub fn apply(
        &self,
        image: C::Image,
        dst_width: u32,
        dst_height: u32,
        crop: bool,
    ) -> Result<C::Image, Error> {
        let (width, height) = image.dimensions();
        let plan = ShrinkPlan::compute(width, height, dst_width, dst_height, crop);
        tracing::debug!(
            width,
            height,
            dst_width,
            dst_height,
            factor = plan.factor,
            residual = plan.residual,
            "Planned shrink"
        );

        let mut image = image;
        if plan.factor > 1 {
            image = self
                .codec
                .shrink(image, plan.factor, plan.factor)
                .map_err(Error::transform("shrink"))?;
        }
        if plan.has_residual() {
            image = self
                .codec
                .affine_bilinear(image, plan.residual, plan.residual)
                .map_err(Error::transform("affine"))?;
        }

        if crop {
            let (width, height) = image.dimensions();
            let area = centered_area(width, height, dst_width, dst_height);
            if !area.covers(width, height) {
                tracing::debug!(?area, "Cropping");
                image = self
                    .codec
                    .extract_area(image, area)
                    .map_err(Error::transform("extract_area"))?;
            }
        }

        Ok(image)
    }
}
