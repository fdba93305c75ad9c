use super::SpriteImage;

/// One sprite of a batch.
///
/// `x`/`y` are the sprite center in drawing-buffer pixels; `z` is depth in
/// `[0, 1]` (0 = front). The quad size comes from the batch image's cell size.
#[derive(Debug, Copy, Clone)]
pub struct SpriteDescriptor<'a> {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Radians.
    pub angle: f32,
    /// Uniform scale applied to both axes.
    pub scale: f32,
    /// Image whose cell grid `cell` indexes.
    pub image: &'a SpriteImage,
    pub cell: u32,
}

impl<'a> SpriteDescriptor<'a> {
    /// Unrotated, unscaled sprite at depth 0 showing cell 0.
    pub fn new(image: &'a SpriteImage, x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            angle: 0.0,
            scale: 1.0,
            image,
            cell: 0,
        }
    }

    pub fn with_depth(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_cell(mut self, cell: u32) -> Self {
        self.cell = cell;
        self
    }
}
