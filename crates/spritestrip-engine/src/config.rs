//! Renderer configuration.

use crate::coords::ColorRgba;

/// Hard cap on sprites per batch; sizes the preallocated vertex arena.
pub const MAX_SPRITES: usize = 100_000;

/// What `draw_batch` does with sprites past `max_sprites`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum OverflowPolicy {
    /// Draw the first `max_sprites` sprites and report the rest as dropped.
    #[default]
    Truncate,
    /// Draw nothing and return `RenderError::BatchOverflow`.
    Reject,
}

/// Renderer-level settings. GPU/surface settings live in `device::GpuInit`.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Sprites per batch. The vertex arena is allocated for this many up front.
    pub max_sprites: usize,

    /// Color the frame is cleared to in `begin_frame`.
    pub clear_color: ColorRgba,

    pub overflow: OverflowPolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_sprites: MAX_SPRITES,
            // Dim red: a broken pipeline shows up as a red screen, not a black one.
            clear_color: ColorRgba::new(0.2, 0.0, 0.0, 1.0),
            overflow: OverflowPolicy::Truncate,
        }
    }
}
