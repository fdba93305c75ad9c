/// Drawing-buffer size in physical pixels.
///
/// The projection matrix and the solid-fill `resolution` uniform are both
/// derived from this.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn from_physical(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }

    /// Same viewport with each axis clamped to at least one pixel.
    ///
    /// A minimized window reports 0×0; dividing by that would poison every
    /// vertex with infinities.
    #[inline]
    pub fn non_degenerate(self) -> Self {
        Self::new(self.width.max(1.0), self.height.max(1.0))
    }
}
