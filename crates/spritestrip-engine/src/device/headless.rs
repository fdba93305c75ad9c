//! Command-recording device for unit tests. Keeps every command for the
//! device's lifetime, so it is not built outside `cfg(test)`.

use std::collections::{HashMap, HashSet};

use crate::coords::{ColorRgba, Viewport};
use crate::error::{RenderError, Result};
use crate::render::{ProgramKind, ProgramSource};
use crate::sprite::{ImageId, SpriteImage};

use super::{
    AttributeHandle, DeviceCapabilities, DeviceContext, ProgramHandle, SurfaceErrorAction,
    TextureHandle, UniformHandle, UniformSlot, UniformValue,
};

/// One call made against a [`HeadlessDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CreateProgram(ProgramKind),
    UseProgram(Option<ProgramHandle>),
    EnableAttribute(AttributeHandle),
    DisableAttribute(AttributeHandle),
    SetUniform(UniformHandle, UniformValue),
    UploadTexture {
        texture: TextureHandle,
        image: ImageId,
        width: u32,
        height: u32,
    },
    BindTexture {
        unit: u32,
        texture: Option<TextureHandle>,
    },
    ReleaseTexture(TextureHandle),
    WriteVertexStream {
        stream: u32,
        floats: usize,
    },
    UnbindVertexStreams,
    DrawTriangleStrip(u32),
    BeginFrame(ColorRgba),
    EndFrame,
    Resize(u32, u32),
}

/// Device that executes nothing and remembers everything.
///
/// Failure injection (`failing_compile`, `dropping_attribute`) lets startup
/// error paths run without a GPU.
#[derive(Debug)]
pub struct HeadlessDevice {
    size: (u32, u32),
    capabilities: DeviceCapabilities,

    programs: Vec<ProgramKind>,
    current_program: Option<ProgramHandle>,
    enabled: HashSet<AttributeHandle>,
    uniforms: HashMap<UniformHandle, UniformValue>,
    streams: HashMap<u32, Vec<f32>>,

    next_texture: u32,
    live_textures: HashSet<TextureHandle>,
    bound: HashMap<u32, TextureHandle>,

    commands: Vec<DeviceCommand>,

    failing_compile: Option<ProgramKind>,
    dropped_attribute: Option<(ProgramKind, &'static str)>,
}

impl HeadlessDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            capabilities: DeviceCapabilities::default(),
            programs: Vec::new(),
            current_program: None,
            enabled: HashSet::new(),
            uniforms: HashMap::new(),
            streams: HashMap::new(),
            next_texture: 1,
            live_textures: HashSet::new(),
            bound: HashMap::new(),
            commands: Vec::new(),
            failing_compile: None,
            dropped_attribute: None,
        }
    }

    pub fn with_capabilities(mut self, capabilities: DeviceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Makes `create_program` fail for `kind`.
    pub fn failing_compile(mut self, kind: ProgramKind) -> Self {
        self.failing_compile = Some(kind);
        self
    }

    /// Makes `attribute_location` miss `name` on `kind`'s program.
    pub fn dropping_attribute(mut self, kind: ProgramKind, name: &'static str) -> Self {
        self.dropped_attribute = Some((kind, name));
        self
    }

    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.current_program
    }

    pub fn enabled_attributes(&self) -> impl Iterator<Item = &AttributeHandle> {
        self.enabled.iter()
    }

    /// Number of distinct programs with at least one enabled attribute.
    pub fn enabled_program_count(&self) -> usize {
        self.enabled
            .iter()
            .map(|a| a.program)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Last data written to vertex stream `stream`.
    pub fn stream(&self, stream: u32) -> Option<&[f32]> {
        self.streams.get(&stream).map(Vec::as_slice)
    }

    pub fn uniform(&self, uniform: UniformHandle) -> Option<UniformValue> {
        self.uniforms.get(&uniform).copied()
    }

    pub fn bound_texture(&self, unit: u32) -> Option<TextureHandle> {
        self.bound.get(&unit).copied()
    }

    pub fn live_texture_count(&self) -> usize {
        self.live_textures.len()
    }

    pub fn upload_count(&self) -> usize {
        self.count(|c| matches!(c, DeviceCommand::UploadTexture { .. }))
    }

    /// Vertex count of every draw, in order.
    pub fn draw_calls(&self) -> Vec<u32> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::DrawTriangleStrip(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DeviceCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    fn program_kind(&self, program: ProgramHandle) -> Option<ProgramKind> {
        self.programs.get(program.0 as usize).copied()
    }
}

impl DeviceContext for HeadlessDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn drawing_buffer_size(&self) -> Viewport {
        Viewport::from_physical(self.size.0, self.size.1)
    }

    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramHandle> {
        if self.failing_compile == Some(source.kind) {
            return Err(RenderError::ShaderCompileFailed {
                program: source.kind,
                message: "injected compile failure".into(),
            });
        }
        let handle = ProgramHandle(self.programs.len() as u32);
        self.programs.push(source.kind);
        self.commands.push(DeviceCommand::CreateProgram(source.kind));
        Ok(handle)
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<AttributeHandle> {
        let kind = self.program_kind(program)?;
        if self.dropped_attribute.is_some_and(|(k, n)| k == kind && n == name) {
            return None;
        }
        kind.source()
            .attributes()
            .find(|a| a.name == name)
            .map(|a| AttributeHandle { program, location: a.location })
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformHandle> {
        let kind = self.program_kind(program)?;
        if !kind.source().uniforms.contains(&name) {
            return None;
        }
        let slot = UniformSlot::from_name(name)?;
        Some(UniformHandle { program, slot })
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.current_program = program;
        self.commands.push(DeviceCommand::UseProgram(program));
    }

    fn set_attribute_enabled(&mut self, attribute: AttributeHandle, enabled: bool) {
        if enabled {
            self.enabled.insert(attribute);
            self.commands.push(DeviceCommand::EnableAttribute(attribute));
        } else {
            self.enabled.remove(&attribute);
            self.commands.push(DeviceCommand::DisableAttribute(attribute));
        }
    }

    fn set_uniform(&mut self, uniform: UniformHandle, value: UniformValue) {
        self.uniforms.insert(uniform, value);
        self.commands.push(DeviceCommand::SetUniform(uniform, value));
    }

    fn upload_texture(&mut self, image: &SpriteImage) -> Result<TextureHandle> {
        let max = self.capabilities.max_texture_dimension;
        if image.width() > max || image.height() > max {
            return Err(RenderError::TextureTooLarge {
                width: image.width(),
                height: image.height(),
                max,
            });
        }
        let texture = TextureHandle(self.next_texture);
        self.next_texture += 1;
        self.live_textures.insert(texture);
        self.commands.push(DeviceCommand::UploadTexture {
            texture,
            image: image.id(),
            width: image.width(),
            height: image.height(),
        });
        Ok(texture)
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>) {
        match texture {
            Some(t) => self.bound.insert(unit, t),
            None => self.bound.remove(&unit),
        };
        self.commands.push(DeviceCommand::BindTexture { unit, texture });
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        self.live_textures.remove(&texture);
        self.bound.retain(|_, t| *t != texture);
        self.commands.push(DeviceCommand::ReleaseTexture(texture));
    }

    fn write_vertex_stream(&mut self, stream: u32, data: &[f32]) {
        let slot = self.streams.entry(stream).or_default();
        slot.clear();
        slot.extend_from_slice(data);
        self.commands.push(DeviceCommand::WriteVertexStream { stream, floats: data.len() });
    }

    fn unbind_vertex_streams(&mut self) {
        self.streams.clear();
        self.commands.push(DeviceCommand::UnbindVertexStreams);
    }

    fn draw_triangle_strip(&mut self, vertex_count: u32) {
        self.commands.push(DeviceCommand::DrawTriangleStrip(vertex_count));
    }

    fn begin_frame(&mut self, clear: ColorRgba) {
        self.commands.push(DeviceCommand::BeginFrame(clear));
    }

    fn end_frame(&mut self) -> Result<(), SurfaceErrorAction> {
        self.commands.push(DeviceCommand::EndFrame);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.commands.push(DeviceCommand::Resize(width, height));
    }
}
