//! Two-stage shrink planning.
//!
//! A resize is split into an integer box shrink (cheap and stable across
//! large factors) followed by a single bilinear pass for the fractional
//! remainder. [`ShrinkPlan::compute`] picks the split.

/// How to reduce a source toward a target size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShrinkPlan {
    /// Integer box-shrink factor, at least 1.
    pub factor: u32,
    /// Remaining scale after the box shrink, in `(0, 1]`.
    pub residual: f64,
}

impl ShrinkPlan {
    /// Plan the shrink of a `src_width`x`src_height` image toward
    /// `dst_width`x`dst_height`.
    ///
    /// With `crop`, the smaller axis ratio wins so the result covers the
    /// target and can be cropped to it; without, the larger ratio wins so the
    /// result fits inside the target. The plan never upsamples.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let plan = ShrinkPlan::compute(800, 600, 200, 200, true);
    /// assert_eq!(plan.factor, 3);
    /// assert_eq!(plan.residual, 1.0);
    /// ```
    pub fn compute(src_width: u32, src_height: u32, dst_width: u32, dst_height: u32, crop: bool) -> Self {
        let x_ratio = src_width as f64 / dst_width.max(1) as f64;
        let y_ratio = src_height as f64 / dst_height.max(1) as f64;

        let raw = if crop {
            x_ratio.min(y_ratio)
        } else {
            x_ratio.max(y_ratio)
        }
        .max(1.0);

        let factor = raw.floor();
        Self {
            factor: factor as u32,
            residual: factor / raw,
        }
    }

    /// Whether the bilinear pass changes anything.
    pub fn has_residual(&self) -> bool {
        self.residual < 1.0
    }
}
