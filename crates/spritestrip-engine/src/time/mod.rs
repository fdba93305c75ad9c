//! Frame timing.
//!
//! - [`FrameClock`]: one per render loop; `tick()` once per presented frame
//! - [`RateMeter`]: periodic fps sampling for logs

mod frame_clock;
mod rate_meter;

pub use frame_clock::{FrameClock, FrameTime};
pub use rate_meter::{RateMeter, RateSample};
