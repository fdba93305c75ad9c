//! Window and event loop.
//!
//! Owns the `winit` event loop and the window, and the renderer drawing into it.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
