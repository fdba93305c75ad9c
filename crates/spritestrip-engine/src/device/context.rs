use glam::Mat3;

use crate::coords::{ColorRgba, Viewport};
use crate::error::Result;
use crate::render::ProgramSource;
use crate::sprite::SpriteImage;

use super::SurfaceErrorAction;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramHandle(pub u32);

/// Vertex attribute of a specific program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttributeHandle {
    pub program: ProgramHandle,
    pub location: u32,
}

/// Uniform of a specific program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformHandle {
    pub program: ProgramHandle,
    pub slot: UniformSlot,
}

/// Fixed uniform slots shared by every program's uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformSlot {
    Projection,
    Model,
    Sampler,
    Resolution,
}

impl UniformSlot {
    pub fn from_name(name: &str) -> Option<Self> {
        use crate::render::program::{U_MODEL, U_PROJECTION, U_RESOLUTION, U_SAMPLER};
        match name {
            U_PROJECTION => Some(UniformSlot::Projection),
            U_MODEL => Some(UniformSlot::Model),
            U_SAMPLER => Some(UniformSlot::Sampler),
            U_RESOLUTION => Some(UniformSlot::Resolution),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Mat3(Mat3),
    Vec2([f32; 2]),
    /// Texture unit the sampler reads from.
    Sampler(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DeviceCapabilities {
    /// Largest width or height a texture may have.
    pub max_texture_dimension: u32,
    /// Texture units usable from the vertex stage; zero means no image modes.
    pub max_vertex_texture_units: u32,
    /// Largest single buffer, in bytes; bounds one frame's vertex data.
    pub max_buffer_size: u64,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_dimension: 8192,
            max_vertex_texture_units: 16,
            max_buffer_size: 1 << 28,
        }
    }
}

/// Immediate-mode graphics device the renderer drives.
///
/// Calls mirror a classic bind-then-draw API: programs are made current,
/// attributes enabled, uniforms and vertex streams written, and each
/// `draw_triangle_strip` consumes whatever is bound at that moment.
pub trait DeviceContext {
    fn capabilities(&self) -> DeviceCapabilities;

    /// Current drawing-buffer size in physical pixels.
    fn drawing_buffer_size(&self) -> Viewport;

    /// Compiles `source`. Fails with `ShaderCompileFailed`.
    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramHandle>;

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<AttributeHandle>;

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformHandle>;

    /// `None` unbinds the current program.
    fn use_program(&mut self, program: Option<ProgramHandle>);

    fn set_attribute_enabled(&mut self, attribute: AttributeHandle, enabled: bool);

    fn set_uniform(&mut self, uniform: UniformHandle, value: UniformValue);

    /// Creates a texture from `image`'s pixels. Does not bind it.
    fn upload_texture(&mut self, image: &SpriteImage) -> Result<TextureHandle>;

    /// `None` unbinds `unit`.
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>);

    fn release_texture(&mut self, texture: TextureHandle);

    /// Replaces the contents of vertex stream `stream` with `data`.
    fn write_vertex_stream(&mut self, stream: u32, data: &[f32]);

    fn unbind_vertex_streams(&mut self);

    /// Draws `vertex_count` vertices from the bound streams as a triangle strip.
    fn draw_triangle_strip(&mut self, vertex_count: u32);

    /// Resets the viewport to the drawing buffer and clears color and depth.
    fn begin_frame(&mut self, clear: ColorRgba);

    /// Flushes the frame's draws and presents.
    fn end_frame(&mut self) -> Result<(), SurfaceErrorAction>;

    fn resize(&mut self, width: u32, height: u32);
}
