use std::collections::HashSet;

use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::{ColorRgba, Viewport};
use crate::error::{RenderError, Result};
use crate::math::transform::to_uniform_cols;
use crate::render::{ProgramKind, ProgramSource};
use crate::sprite::SpriteImage;

use super::frame::{FrameRecorder, UniformBlock, grown_capacity};
use super::mip::mip_chain;
use super::{
    AttributeHandle, DeviceCapabilities, DeviceContext, Gpu, GpuInit, ProgramHandle,
    SurfaceErrorAction, TextureHandle, UniformHandle, UniformSlot, UniformValue,
};

const INITIAL_VERTEX_BYTES: u64 = 1 << 16;
const INITIAL_UNIFORM_BYTES: u64 = 1 << 14;

struct GpuProgram {
    kind: ProgramKind,
    pipeline: wgpu::RenderPipeline,
    uniforms: UniformBlock,
}

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Buffer that grows (never shrinks) to fit each frame's staging data.
struct FrameBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: wgpu::Buffer,
    capacity: u64,
    max: u64,
}

impl FrameBuffer {
    fn new(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages, capacity: u64) -> Self {
        let max = device.limits().max_buffer_size;
        let capacity = capacity.min(max);
        let buffer = create_buffer(device, label, usage, capacity);
        Self { label, usage, buffer, capacity, max }
    }

    /// Returns true when the buffer was recreated.
    fn ensure(&mut self, device: &wgpu::Device, required: u64) -> bool {
        let Some(capacity) = grown_capacity(required, self.capacity, self.max) else {
            return false;
        };
        log::debug!("{}: growing {} -> {} bytes", self.label, self.capacity, capacity);
        self.buffer = create_buffer(device, self.label, self.usage, capacity);
        self.capacity = capacity;
        true
    }
}

fn create_buffer(
    device: &wgpu::Device,
    label: &'static str,
    usage: wgpu::BufferUsages,
    size: u64,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// [`DeviceContext`] over wgpu.
///
/// Draws are recorded while the frame is open and replayed in a single render
/// pass by `end_frame`, which clears color and depth first.
pub struct WgpuDevice<'w> {
    gpu: Gpu<'w>,

    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    programs: Vec<GpuProgram>,
    textures: Vec<Option<GpuTexture>>,

    current_program: Option<ProgramHandle>,
    enabled: HashSet<AttributeHandle>,
    bound_texture: Option<TextureHandle>,

    recorder: FrameRecorder<wgpu::BindGroup>,
    frame_open: bool,

    vertices: FrameBuffer,
    uniforms: FrameBuffer,
    uniform_bind_group: wgpu::BindGroup,
}

impl<'w> WgpuDevice<'w> {
    /// Creates the GPU context for `window` and wraps it.
    pub fn create(window: &'w Window, init: GpuInit) -> Result<Self> {
        let gpu = pollster::block_on(Gpu::new(window, init))
            .map_err(|e| RenderError::DeviceUnavailable(format!("{e:#}")))?;
        Ok(Self::new(gpu))
    }

    pub fn new(gpu: Gpu<'w>) -> Self {
        let device = gpu.device();

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("spritestrip uniforms bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(UniformBlock::SIZE),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("spritestrip texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("spritestrip sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        let vertices = FrameBuffer::new(
            device,
            "spritestrip vertices",
            wgpu::BufferUsages::VERTEX,
            INITIAL_VERTEX_BYTES,
        );
        let uniforms = FrameBuffer::new(
            device,
            "spritestrip uniforms",
            wgpu::BufferUsages::UNIFORM,
            INITIAL_UNIFORM_BYTES,
        );
        let uniform_bind_group = create_uniform_bind_group(device, &uniform_layout, &uniforms.buffer);

        let alignment = gpu.limits().min_uniform_buffer_offset_alignment as usize;

        Self {
            uniform_layout,
            texture_layout,
            sampler,
            programs: Vec::new(),
            textures: Vec::new(),
            current_program: None,
            enabled: HashSet::new(),
            bound_texture: None,
            recorder: FrameRecorder::new(alignment, gpu.limits().max_buffer_size),
            frame_open: false,
            vertices,
            uniforms,
            uniform_bind_group,
            gpu,
        }
    }

    fn program(&self, handle: ProgramHandle) -> Option<&GpuProgram> {
        self.programs.get(handle.0 as usize)
    }

    fn compile(&self, source: &ProgramSource) -> Result<wgpu::ShaderModule> {
        let module = self.gpu.device().create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label),
            source: wgpu::ShaderSource::Wgsl(source.wgsl.into()),
        });

        let info = pollster::block_on(module.get_compilation_info());
        let errors: Vec<String> = info
            .messages
            .iter()
            .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
            .map(|m| m.message.clone())
            .collect();
        if !errors.is_empty() {
            return Err(RenderError::ShaderCompileFailed {
                program: source.kind,
                message: errors.join("; "),
            });
        }
        Ok(module)
    }

    fn build_pipeline(&self, source: &ProgramSource, shader: &wgpu::ShaderModule) -> wgpu::RenderPipeline {
        let device = self.gpu.device();

        let mut layouts = vec![&self.uniform_layout];
        if source.kind.is_textured() {
            layouts.push(&self.texture_layout);
        }
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(source.label),
            bind_group_layouts: &layouts,
            immediate_size: 0,
        });

        let attributes: Vec<Vec<wgpu::VertexAttribute>> = source
            .streams
            .iter()
            .map(|stream| {
                stream
                    .attributes
                    .iter()
                    .map(|a| wgpu::VertexAttribute {
                        format: vertex_format(a.components),
                        offset: float_bytes(a.offset),
                        shader_location: a.location,
                    })
                    .collect()
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = source
            .streams
            .iter()
            .zip(&attributes)
            .map(|(stream, attrs)| wgpu::VertexBufferLayout {
                array_stride: float_bytes(stream.stride),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let depth_stencil = self.gpu.depth_format().map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(source.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.surface_format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    /// Checks that everything `program` reads is bound. Returns the texture
    /// bind group for image programs.
    fn draw_inputs(&self, handle: ProgramHandle) -> Option<Option<wgpu::BindGroup>> {
        let program = self.program(handle)?;
        let source = program.kind.source();

        if let Some(attr) = source
            .attributes()
            .find(|a| !self.enabled.contains(&AttributeHandle { program: handle, location: a.location }))
        {
            log::warn!("{:?}: attribute `{}` disabled; draw skipped", program.kind, attr.name);
            return None;
        }
        if let Some(i) = (0..source.streams.len()).find(|&i| !self.recorder.stream_bound(i)) {
            log::warn!("{:?}: vertex stream {i} not written; draw skipped", program.kind);
            return None;
        }
        if !source.kind.is_textured() {
            return Some(None);
        }

        let texture = self
            .bound_texture
            .and_then(|t| self.textures.get(t.0 as usize))
            .and_then(Option::as_ref);
        match texture {
            Some(t) => Some(Some(t.bind_group.clone())),
            None => {
                log::warn!("{:?}: no texture bound; draw skipped", program.kind);
                None
            }
        }
    }

    fn replay(&mut self, frame: &mut super::GpuFrame) {
        let device = self.gpu.device();
        let queue = self.gpu.queue();

        let vertex_bytes = self.recorder.vertex_bytes();
        let uniform_bytes = self.recorder.uniform_bytes();

        self.vertices.ensure(device, vertex_bytes.len() as u64);
        if self.uniforms.ensure(device, uniform_bytes.len() as u64) {
            self.uniform_bind_group =
                create_uniform_bind_group(device, &self.uniform_layout, &self.uniforms.buffer);
        }
        if !vertex_bytes.is_empty() {
            queue.write_buffer(&self.vertices.buffer, 0, vertex_bytes);
        }
        if !uniform_bytes.is_empty() {
            queue.write_buffer(&self.uniforms.buffer, 0, uniform_bytes);
        }

        let depth_stencil_attachment =
            self.gpu
                .depth_view()
                .map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("spritestrip pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.recorder.clear_color().into()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for draw in self.recorder.draws() {
            let Some(program) = self.programs.get(draw.program.0 as usize) else {
                continue;
            };
            rpass.set_pipeline(&program.pipeline);
            rpass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);
            if let Some(texture) = draw.texture.as_ref() {
                rpass.set_bind_group(1, texture, &[]);
            }
            for (slot, range) in draw.streams.iter().enumerate() {
                if let Some(range) = range {
                    rpass.set_vertex_buffer(slot as u32, self.vertices.buffer.slice(range.clone()));
                }
            }
            rpass.draw(0..draw.vertex_count, 0..1);
        }

        log::trace!("replayed {} draws", self.recorder.draws().len());
    }
}

fn create_uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("spritestrip uniforms"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: wgpu::BufferSize::new(UniformBlock::SIZE),
            }),
        }],
    })
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

#[inline]
fn float_bytes(floats: u32) -> u64 {
    floats as u64 * std::mem::size_of::<f32>() as u64
}

impl DeviceContext for WgpuDevice<'_> {
    fn capabilities(&self) -> DeviceCapabilities {
        let limits = self.gpu.limits();
        DeviceCapabilities {
            max_texture_dimension: limits.max_texture_dimension_2d,
            max_vertex_texture_units: limits.max_sampled_textures_per_shader_stage,
            max_buffer_size: limits.max_buffer_size,
        }
    }

    fn drawing_buffer_size(&self) -> Viewport {
        let size = self.gpu.size();
        Viewport::from_physical(size.width, size.height)
    }

    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramHandle> {
        let shader = self.compile(source)?;
        let pipeline = self.build_pipeline(source, &shader);

        let handle = ProgramHandle(self.programs.len() as u32);
        self.programs.push(GpuProgram {
            kind: source.kind,
            pipeline,
            uniforms: UniformBlock::default(),
        });
        Ok(handle)
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<AttributeHandle> {
        let kind = self.program(program)?.kind;
        kind.source()
            .attributes()
            .find(|a| a.name == name)
            .map(|a| AttributeHandle { program, location: a.location })
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformHandle> {
        let kind = self.program(program)?.kind;
        if !kind.source().uniforms.contains(&name) {
            return None;
        }
        UniformSlot::from_name(name).map(|slot| UniformHandle { program, slot })
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.current_program = program;
    }

    fn set_attribute_enabled(&mut self, attribute: AttributeHandle, enabled: bool) {
        if enabled {
            self.enabled.insert(attribute);
        } else {
            self.enabled.remove(&attribute);
        }
    }

    fn set_uniform(&mut self, uniform: UniformHandle, value: UniformValue) {
        let Some(program) = self.programs.get_mut(uniform.program.0 as usize) else {
            return;
        };
        let block = &mut program.uniforms;
        match (uniform.slot, value) {
            (UniformSlot::Projection, UniformValue::Mat3(m)) => block.projection = to_uniform_cols(m),
            (UniformSlot::Model, UniformValue::Mat3(m)) => block.model = to_uniform_cols(m),
            (UniformSlot::Resolution, UniformValue::Vec2(v)) => block.resolution = v,
            // One sampler, always paired with the texture on unit 0.
            (UniformSlot::Sampler, UniformValue::Sampler(0)) => {}
            (slot, value) => log::warn!("uniform {slot:?} cannot take {value:?}; ignored"),
        }
    }

    fn upload_texture(&mut self, image: &SpriteImage) -> Result<TextureHandle> {
        let max = self.gpu.limits().max_texture_dimension_2d;
        let (width, height) = (image.width(), image.height());
        if width > max || height > max {
            return Err(RenderError::TextureTooLarge { width, height, max });
        }

        let levels = mip_chain(width, height, image.pixels());
        let device = self.gpu.device();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("spritestrip image"),
            size,
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in levels.iter().enumerate() {
            self.gpu.queue().write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &level.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level.width),
                    rows_per_image: Some(level.height),
                },
                wgpu::Extent3d {
                    width: level.width,
                    height: level.height,
                    depth_or_array_layers: 1,
                },
            );
        }
        log::debug!("uploaded {width}x{height} texture with {} mip levels", levels.len());

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("spritestrip image bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let entry = GpuTexture {
            _texture: texture,
            bind_group,
        };
        let index = match self.textures.iter().position(Option::is_none) {
            Some(free) => {
                self.textures[free] = Some(entry);
                free
            }
            None => {
                self.textures.push(Some(entry));
                self.textures.len() - 1
            }
        };
        Ok(TextureHandle(index as u32))
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>) {
        if unit != 0 {
            log::warn!("texture unit {unit} unsupported; only unit 0 is sampled");
            return;
        }
        self.bound_texture = texture;
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        // Draws already recorded this frame hold their own bind group clone.
        if let Some(slot) = self.textures.get_mut(texture.0 as usize) {
            *slot = None;
        }
        if self.bound_texture == Some(texture) {
            self.bound_texture = None;
        }
    }

    fn write_vertex_stream(&mut self, stream: u32, data: &[f32]) {
        self.recorder.write_stream(stream, data);
    }

    fn unbind_vertex_streams(&mut self) {
        self.recorder.clear_streams();
    }

    fn draw_triangle_strip(&mut self, vertex_count: u32) {
        if !self.frame_open {
            log::warn!("draw outside begin_frame/end_frame; skipped");
            return;
        }
        let Some(handle) = self.current_program else {
            log::warn!("draw with no program; skipped");
            return;
        };
        let Some(texture) = self.draw_inputs(handle) else {
            return;
        };
        let Some(program) = self.program(handle) else {
            return;
        };
        let uniforms = program.uniforms;
        // refusals are logged by the recorder
        let _ = self.recorder.push_draw(handle, texture, &uniforms, vertex_count);
    }

    fn begin_frame(&mut self, clear: ColorRgba) {
        self.recorder.begin(clear);
        self.frame_open = true;
    }

    fn end_frame(&mut self) -> std::result::Result<(), SurfaceErrorAction> {
        self.frame_open = false;

        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => return Err(self.gpu.handle_surface_error(err)),
        };
        self.replay(&mut frame);
        self.gpu.submit(frame);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(PhysicalSize::new(width, height));
    }
}
