use crate::config::RendererConfig;
use crate::coords::ColorRgba;
use crate::device::{DeviceCapabilities, DeviceContext, SurfaceErrorAction};
use crate::error::{RenderError, Result};
use crate::sprite::{SpriteDescriptor, SpriteImage};

use super::batch::{BatchStats, SpriteBatchBuilder, strip_vertex_count};
use super::image::SingleImageDrawer;
use super::program::ProgramRegistry;
use super::rect::SolidRectDrawer;
use super::state::RenderStateMachine;
use super::texture::TextureCache;
use super::vertex::BatchVertex;

/// Per-frame counters, reset by `begin_frame`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub vertices: u64,
    pub sprites: u64,
    pub texture_uploads: u64,
    pub program_switches: u64,
}

/// Immediate-mode 2D renderer over a [`DeviceContext`].
///
/// Each draw call activates its program, binds its texture and issues exactly
/// one device draw. Per-draw errors skip that draw only.
pub struct Renderer<D: DeviceContext> {
    device: D,
    config: RendererConfig,

    programs: ProgramRegistry,
    state: RenderStateMachine,
    textures: TextureCache,

    batch: SpriteBatchBuilder,
    rects: SolidRectDrawer,
    images: SingleImageDrawer,

    stats: FrameStats,
    uploads_at_begin: u64,
    switches_at_begin: u64,
}

impl<D: DeviceContext> Renderer<D> {
    /// Checks device capabilities and the sprite cap, then creates the three
    /// programs.
    pub fn initialize(mut device: D, config: RendererConfig) -> Result<Self> {
        let caps = device.capabilities();
        if caps.max_vertex_texture_units == 0 {
            return Err(RenderError::DeviceUnavailable(
                "device exposes no vertex-stage texture units".into(),
            ));
        }
        check_sprite_cap(config.max_sprites, &caps)?;

        let programs = ProgramRegistry::new(&mut device)?;
        let batch = SpriteBatchBuilder::new(config.max_sprites, config.overflow);

        log::debug!(
            "renderer ready: max texture {}, max sprites {}",
            caps.max_texture_dimension,
            config.max_sprites
        );

        Ok(Self {
            device,
            config,
            programs,
            state: RenderStateMachine::new(),
            textures: TextureCache::new(),
            batch,
            rects: SolidRectDrawer,
            images: SingleImageDrawer,
            stats: FrameStats::default(),
            uploads_at_begin: 0,
            switches_at_begin: 0,
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Clears color and depth and starts a new frame.
    pub fn begin_frame(&mut self) {
        self.begin_frame_with(self.config.clear_color);
    }

    pub fn begin_frame_with(&mut self, clear: ColorRgba) {
        self.stats = FrameStats::default();
        self.uploads_at_begin = self.textures.upload_count();
        self.switches_at_begin = self.state.switches();
        self.device.begin_frame(clear);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: ColorRgba) {
        self.rects.fill_rect(
            &mut self.device,
            &self.programs,
            &mut self.state,
            &mut self.textures,
            x,
            y,
            width,
            height,
            color,
        );
        self.count_draw(4, 0);
    }

    /// Draws cell 0 of `image` centered at `(x, y)`.
    pub fn draw_image(&mut self, x: f32, y: f32, image: &SpriteImage, angle: f32, scale: f32) -> Result<()> {
        let drawn = self.images.draw_image(
            &mut self.device,
            &self.programs,
            &mut self.state,
            &mut self.textures,
            x,
            y,
            image,
            angle,
            scale,
        );
        match drawn {
            Ok(()) => {
                self.count_draw(4, 1);
                Ok(())
            }
            Err(e) => Err(skipped("draw_image", e)),
        }
    }

    /// Draws `sprites` with `image`'s texture in one strip.
    pub fn draw_batch(&mut self, sprites: &[SpriteDescriptor<'_>], image: &SpriteImage) -> Result<BatchStats> {
        let drawn = self.batch.draw(
            &mut self.device,
            &self.programs,
            &mut self.state,
            &mut self.textures,
            sprites,
            image,
        );
        match drawn {
            Ok(stats) => {
                if stats.vertices > 0 {
                    self.count_draw(stats.vertices as u64, stats.sprites as u64);
                }
                Ok(stats)
            }
            Err(e) => Err(skipped("draw_batch", e)),
        }
    }

    /// Unbinds vertex streams, the texture and the program, and forgets all
    /// cached state.
    pub fn reset(&mut self) {
        self.device.unbind_vertex_streams();
        self.textures.invalidate(&mut self.device);
        self.state.deactivate_all(&mut self.device, &self.programs);
        log::debug!("render state reset");
    }

    /// Finishes the frame and presents it.
    pub fn end_frame(&mut self) -> std::result::Result<FrameStats, SurfaceErrorAction> {
        self.stats.texture_uploads = self.textures.upload_count() - self.uploads_at_begin;
        self.stats.program_switches = self.state.switches() - self.switches_at_begin;
        self.device.end_frame()?;
        Ok(self.stats)
    }

    /// Counters for the frame in progress (or the last finished one).
    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Resizes the drawing buffer. Cached state is reset so the projection is
    /// rebuilt on the next image draw.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.device.resize(width, height);
        self.reset();
    }

    fn count_draw(&mut self, vertices: u64, sprites: u64) {
        self.stats.draw_calls += 1;
        self.stats.vertices += vertices;
        self.stats.sprites += sprites;
    }
}

/// A full batch must fit in one device buffer.
fn check_sprite_cap(max_sprites: usize, caps: &DeviceCapabilities) -> Result<()> {
    if max_sprites == 0 {
        return Err(RenderError::InvalidConfig("max_sprites must be at least 1".into()));
    }
    let bytes = strip_vertex_count(max_sprites)
        .checked_mul(std::mem::size_of::<BatchVertex>())
        .map(|b| b as u64);
    match bytes {
        Some(b) if b <= caps.max_buffer_size => Ok(()),
        _ => Err(RenderError::InvalidConfig(format!(
            "max_sprites {max_sprites} needs more vertex memory than the device buffer limit of {} bytes",
            caps.max_buffer_size
        ))),
    }
}

fn skipped(what: &str, err: RenderError) -> RenderError {
    log::warn!("{what} skipped: {err}");
    err
}
