//! The transform stages and the math behind them.
//!
//! A transform runs, in order:
//! 1. Orientation lookup (auto-orient only)
//! 2. Resize: integer box shrink, bilinear residual, optional centered crop
//! 3. Rotation
//! 4. Write, then orientation normalization (auto-orient only)
//!
//! Stages take ownership of the incoming image handle and return the next
//! one; nothing here touches pixels directly.

mod crop;
mod options;
mod orientation;
mod plan;
mod resize;
mod rotation;

pub use crop::centered_area;
pub use options::PathOptionEncoder;
pub use orientation::{Orientation, OrientationResolver};
pub use plan::ShrinkPlan;
pub use resize::ResizeCropStage;
pub use rotation::RotateStage;
