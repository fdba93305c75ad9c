//! Plain geometry and color types shared by the drawers and the device layer.
//!
//! Pixel space:
//! - physical drawing-buffer pixels
//! - origin top-left
//! - +X right, +Y down
//!
//! Texture space is normalized `[0, 1]` on both axes.

mod color;
mod rect;
mod viewport;

pub use color::ColorRgba;
pub use rect::Rect;
pub use viewport::Viewport;
