//! The three shader programs and their attribute/uniform handles.

use crate::device::{AttributeHandle, DeviceContext, ProgramHandle, UniformHandle};
use crate::error::{RenderError, Result};

/// Which of the three programs a draw uses.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ProgramKind {
    /// Per-vertex colored geometry in pixel space.
    Solid,
    /// One textured quad with a model-matrix uniform.
    SingleImage,
    /// Many textured quads with per-vertex transforms in one strip.
    BatchImage,
}

impl ProgramKind {
    /// Image modes sample a texture and must rebind it after activation.
    #[inline]
    pub fn is_textured(self) -> bool {
        !matches!(self, ProgramKind::Solid)
    }

    pub fn source(self) -> &'static ProgramSource {
        match self {
            ProgramKind::Solid => &SOLID,
            ProgramKind::SingleImage => &SINGLE_IMAGE,
            ProgramKind::BatchImage => &BATCH_IMAGE,
        }
    }
}

/// One vertex attribute inside a stream. Sizes and offsets are in floats.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttributeLayout {
    pub name: &'static str,
    pub location: u32,
    pub components: u32,
    pub offset: u32,
}

/// One vertex buffer slot. `stride` is in floats.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexStreamLayout {
    pub stride: u32,
    pub attributes: &'static [AttributeLayout],
}

/// Static description of a program: WGSL module plus the names the renderer
/// resolves against it after creation.
#[derive(Debug, Copy, Clone)]
pub struct ProgramSource {
    pub kind: ProgramKind,
    pub label: &'static str,
    pub wgsl: &'static str,
    pub streams: &'static [VertexStreamLayout],
    pub uniforms: &'static [&'static str],
}

impl ProgramSource {
    pub fn attributes(&self) -> impl Iterator<Item = &'static AttributeLayout> + '_ {
        self.streams.iter().flat_map(|s| s.attributes.iter())
    }
}

pub const U_PROJECTION: &str = "uProjectionMatrix";
pub const U_MODEL: &str = "uModelMatrix";
pub const U_SAMPLER: &str = "uImageSampler";
pub const U_RESOLUTION: &str = "resolution";

pub static SOLID: ProgramSource = ProgramSource {
    kind: ProgramKind::Solid,
    label: "spritestrip solid",
    wgsl: include_str!("shaders/solid.wgsl"),
    streams: &[
        VertexStreamLayout {
            stride: 2,
            attributes: &[AttributeLayout { name: "aPosition", location: 0, components: 2, offset: 0 }],
        },
        VertexStreamLayout {
            stride: 4,
            attributes: &[AttributeLayout { name: "color", location: 1, components: 4, offset: 0 }],
        },
    ],
    uniforms: &[U_RESOLUTION],
};

pub static SINGLE_IMAGE: ProgramSource = ProgramSource {
    kind: ProgramKind::SingleImage,
    label: "spritestrip image",
    wgsl: include_str!("shaders/image.wgsl"),
    streams: &[VertexStreamLayout {
        stride: 4,
        attributes: &[AttributeLayout { name: "aPosition", location: 0, components: 4, offset: 0 }],
    }],
    uniforms: &[U_PROJECTION, U_MODEL, U_SAMPLER],
};

pub static BATCH_IMAGE: ProgramSource = ProgramSource {
    kind: ProgramKind::BatchImage,
    label: "spritestrip batch",
    wgsl: include_str!("shaders/batch.wgsl"),
    streams: &[VertexStreamLayout {
        stride: 11,
        attributes: &[
            AttributeLayout { name: "aPosition", location: 0, components: 4, offset: 0 },
            AttributeLayout { name: "aTransform", location: 1, components: 4, offset: 4 },
            AttributeLayout { name: "aTranslate", location: 2, components: 3, offset: 8 },
        ],
    }],
    uniforms: &[U_PROJECTION, U_SAMPLER],
};

/// A created program with every handle the drawers need.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub kind: ProgramKind,
    pub handle: ProgramHandle,
    pub attributes: Vec<AttributeHandle>,
    pub projection: Option<UniformHandle>,
    pub model: Option<UniformHandle>,
    pub sampler: Option<UniformHandle>,
    pub resolution: Option<UniformHandle>,
}

impl ShaderProgram {
    fn create<D: DeviceContext>(device: &mut D, source: &ProgramSource) -> Result<Self> {
        let handle = device.create_program(source)?;

        let attributes = source
            .attributes()
            .map(|attr| {
                device
                    .attribute_location(handle, attr.name)
                    .ok_or_else(|| link_error(source.kind, "attribute", attr.name))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut program = ShaderProgram {
            kind: source.kind,
            handle,
            attributes,
            projection: None,
            model: None,
            sampler: None,
            resolution: None,
        };

        for &name in source.uniforms {
            let uniform = device
                .uniform_location(handle, name)
                .ok_or_else(|| link_error(source.kind, "uniform", name))?;
            let slot = match name {
                U_PROJECTION => &mut program.projection,
                U_MODEL => &mut program.model,
                U_SAMPLER => &mut program.sampler,
                U_RESOLUTION => &mut program.resolution,
                _ => return Err(link_error(source.kind, "uniform", name)),
            };
            *slot = Some(uniform);
        }

        log::debug!(
            "created {:?} program ({} attributes, {} uniforms)",
            source.kind,
            program.attributes.len(),
            source.uniforms.len()
        );
        Ok(program)
    }
}

fn link_error(program: ProgramKind, what: &str, name: &str) -> RenderError {
    RenderError::ProgramLinkFailed {
        program,
        message: format!("{what} `{name}` not found"),
    }
}

/// Owns the three programs for the renderer's lifetime.
#[derive(Debug)]
pub struct ProgramRegistry {
    solid: ShaderProgram,
    single_image: ShaderProgram,
    batch_image: ShaderProgram,
}

impl ProgramRegistry {
    /// Creates all three programs. The first failure aborts initialization.
    pub fn new<D: DeviceContext>(device: &mut D) -> Result<Self> {
        Ok(Self {
            solid: ShaderProgram::create(device, &SOLID)?,
            single_image: ShaderProgram::create(device, &SINGLE_IMAGE)?,
            batch_image: ShaderProgram::create(device, &BATCH_IMAGE)?,
        })
    }

    #[inline]
    pub fn get(&self, kind: ProgramKind) -> &ShaderProgram {
        match kind {
            ProgramKind::Solid => &self.solid,
            ProgramKind::SingleImage => &self.single_image,
            ProgramKind::BatchImage => &self.batch_image,
        }
    }
}
