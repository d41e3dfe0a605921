//! Centered crop geometry.

use crate::codec::Area;

/// The rectangle to keep when cropping a `width`x`height` image to
/// `dst_width`x`dst_height`.
///
/// Each axis keeps `min(current, target)` pixels. An odd leftover pixel goes to
/// the leading (left/top) edge: `left = (width - kept + 1) / 2`.
pub fn centered_area(width: u32, height: u32, dst_width: u32, dst_height: u32) -> Area {
    let kept_width = width.min(dst_width);
    let kept_height = height.min(dst_height);
    Area {
        left: (width - kept_width + 1) / 2,
        top: (height - kept_height + 1) / 2,
        width: kept_width,
        height: kept_height,
    }
}
