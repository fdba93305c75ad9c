//! Transform math consumed by the drawers.

pub mod transform;

pub use glam::Mat3;
