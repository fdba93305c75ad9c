//! spritestrip engine crate.
//!
//! A 2D sprite renderer: solid rectangles, single transformed images and large
//! sprite batches drawn as one triangle strip, over wgpu.

pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod error;
pub mod logging;
pub mod math;
pub mod render;
pub mod sprite;
pub mod time;
pub mod window;

pub use config::{MAX_SPRITES, OverflowPolicy, RendererConfig};
pub use error::{RenderError, Result};
pub use render::Renderer;
