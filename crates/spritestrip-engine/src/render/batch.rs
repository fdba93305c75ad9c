//! Sprite batching: many transformed quads in one triangle-strip draw.
//!
//! Quads are stitched with two degenerate vertices per join (previous quad's
//! last vertex, then the next quad's first), so `N` sprites emit `6N - 2`
//! records and the strip never needs a pipeline reset.

use crate::config::OverflowPolicy;
use crate::device::{DeviceContext, UniformValue};
use crate::error::{RenderError, Result};
use crate::math::transform::make_projection;
use crate::sprite::{SpriteDescriptor, SpriteImage};

use super::program::{ProgramKind, ProgramRegistry};
use super::state::RenderStateMachine;
use super::texture::TextureCache;
use super::vertex::{BatchVertex, VertexArena};

/// Strip length for `sprites` quads: `4N + 2(N - 1)`. Saturates.
#[inline]
pub const fn strip_vertex_count(sprites: usize) -> usize {
    if sprites == 0 { 0 } else { sprites.saturating_mul(6) - 2 }
}

/// What one `draw_batch` call did.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct BatchStats {
    /// Sprites packed and drawn.
    pub sprites: usize,
    /// Sprites past the cap that were not drawn.
    pub dropped: usize,
    /// Vertex records in the strip.
    pub vertices: usize,
}

pub struct SpriteBatchBuilder {
    arena: VertexArena<BatchVertex>,
    max_sprites: usize,
    overflow: OverflowPolicy,
    warned_truncation: bool,
}

impl SpriteBatchBuilder {
    /// Allocates the arena for `max_sprites` up front.
    pub fn new(max_sprites: usize, overflow: OverflowPolicy) -> Self {
        Self {
            arena: VertexArena::with_capacity(strip_vertex_count(max_sprites)),
            max_sprites,
            overflow,
            warned_truncation: false,
        }
    }

    fn check_overflow(&self, requested: usize) -> Result<()> {
        if requested > self.max_sprites && self.overflow == OverflowPolicy::Reject {
            return Err(RenderError::BatchOverflow {
                requested,
                max: self.max_sprites,
            });
        }
        Ok(())
    }

    /// Packs `sprites` into the arena.
    ///
    /// Quad extents come from `image`'s cell size; each sprite's texture
    /// rectangle comes from its own image's cell grid.
    pub fn pack(&mut self, sprites: &[SpriteDescriptor<'_>], image: &SpriteImage) -> Result<BatchStats> {
        self.check_overflow(sprites.len())?;

        let count = sprites.len().min(self.max_sprites);
        let dropped = sprites.len() - count;
        if dropped > 0 && !self.warned_truncation {
            log::warn!(
                "batch of {} sprites truncated to {}; further truncations are not logged",
                sprites.len(),
                self.max_sprites
            );
            self.warned_truncation = true;
        }

        let (hw, hh) = image.half_cell_extents();
        let mut w = self.arena.writer();

        for (i, sprite) in sprites[..count].iter().enumerate() {
            let cell = sprite.image.cell_bounds(sprite.cell);
            let rotation = [-sprite.angle.cos(), sprite.angle.sin()];
            let scale = [sprite.scale, sprite.scale];
            let translate = [sprite.x, sprite.y, sprite.z];
            let corner = |local: [f32; 2], tex: [f32; 2]| BatchVertex {
                local,
                tex,
                rotation,
                scale,
                translate,
            };

            let left_bottom = corner([-hw, hh], [cell.x, cell.y]);
            let left_top = corner([-hw, -hh], [cell.x, cell.bottom()]);
            let right_bottom = corner([hw, hh], [cell.right(), cell.y]);
            let right_top = corner([hw, -hh], [cell.right(), cell.bottom()]);

            if i > 0 {
                w.repeat_last();
                w.push(left_bottom);
            }
            w.push(left_bottom);
            w.push(left_top);
            w.push(right_bottom);
            w.push(right_top);
        }

        let vertices = w.len();
        debug_assert_eq!(vertices, strip_vertex_count(count));
        log::trace!("packed {count} sprites into {vertices} vertices");

        Ok(BatchStats {
            sprites: count,
            dropped,
            vertices,
        })
    }

    /// Records produced by the last `pack`.
    pub fn records(&self, stats: &BatchStats) -> &[BatchVertex] {
        self.arena.records(stats.vertices)
    }

    /// Activates the batch program, binds `image` and draws every sprite in
    /// one strip. An empty list changes no state and draws nothing.
    pub fn draw<D: DeviceContext>(
        &mut self,
        device: &mut D,
        programs: &ProgramRegistry,
        state: &mut RenderStateMachine,
        textures: &mut TextureCache,
        sprites: &[SpriteDescriptor<'_>],
        image: &SpriteImage,
    ) -> Result<BatchStats> {
        if sprites.is_empty() {
            return Ok(BatchStats::default());
        }
        self.check_overflow(sprites.len())?;

        state.activate(device, programs, textures, ProgramKind::BatchImage);
        let binding = textures.ensure_bound(device, image)?;
        if binding.uploaded {
            let program = programs.get(ProgramKind::BatchImage);
            let vp = device.drawing_buffer_size();
            if let Some(sampler) = program.sampler {
                device.set_uniform(sampler, UniformValue::Sampler(0));
            }
            if let Some(projection) = program.projection {
                device.set_uniform(projection, UniformValue::Mat3(make_projection(vp.width, vp.height)));
            }
        }

        let stats = self.pack(sprites, image)?;
        if stats.vertices == 0 {
            return Ok(stats);
        }
        device.write_vertex_stream(0, self.arena.as_floats(stats.vertices));
        device.draw_triangle_strip(stats.vertices as u32);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;

    fn sheet(cells_wide: u32, cell: u32) -> SpriteImage {
        let (w, h) = (cells_wide * cell, cell);
        SpriteImage::from_sheet(w, h, vec![0u8; (w * h * 4) as usize], cell, cell).unwrap()
    }

    struct Fixture {
        device: HeadlessDevice,
        programs: ProgramRegistry,
        state: RenderStateMachine,
        textures: TextureCache,
    }

    impl Fixture {
        fn new() -> Self {
            let mut device = HeadlessDevice::new(800, 600);
            let programs = ProgramRegistry::new(&mut device).unwrap();
            device.clear_commands();
            Self {
                device,
                programs,
                state: RenderStateMachine::new(),
                textures: TextureCache::new(),
            }
        }

        fn draw(
            &mut self,
            batch: &mut SpriteBatchBuilder,
            sprites: &[SpriteDescriptor<'_>],
            image: &SpriteImage,
        ) -> Result<BatchStats> {
            batch.draw(
                &mut self.device,
                &self.programs,
                &mut self.state,
                &mut self.textures,
                sprites,
                image,
            )
        }
    }

    #[test]
    fn strip_length_formula() {
        assert_eq!(strip_vertex_count(0), 0);
        assert_eq!(strip_vertex_count(1), 4);
        assert_eq!(strip_vertex_count(3), 16);
        assert_eq!(strip_vertex_count(usize::MAX), usize::MAX - 2);
    }

    #[test]
    fn single_sprite_uses_half_cell_offsets_and_first_cell() {
        let img = sheet(2, 16);
        let mut batch = SpriteBatchBuilder::new(8, OverflowPolicy::Truncate);
        let stats = batch.pack(&[SpriteDescriptor::new(&img, 100.0, 50.0)], &img).unwrap();

        assert_eq!(stats.vertices, 4);
        let r = batch.records(&stats);
        let locals: Vec<[f32; 2]> = r.iter().map(|v| v.local).collect();
        assert_eq!(locals, vec![[-8.0, 8.0], [-8.0, -8.0], [8.0, 8.0], [8.0, -8.0]]);

        let texs: Vec<[f32; 2]> = r.iter().map(|v| v.tex).collect();
        assert_eq!(texs, vec![[0.0, 0.0], [0.0, 1.0], [0.5, 0.0], [0.5, 1.0]]);

        assert!(r.iter().all(|v| v.translate == [100.0, 50.0, 0.0]));
        assert!(r.iter().all(|v| v.rotation == [-1.0, 0.0] && v.scale == [1.0, 1.0]));
    }

    #[test]
    fn quads_are_joined_by_two_degenerate_vertices() {
        let img = sheet(2, 16);
        let mut batch = SpriteBatchBuilder::new(8, OverflowPolicy::Truncate);
        let sprites = [
            SpriteDescriptor::new(&img, 0.0, 0.0),
            SpriteDescriptor::new(&img, 40.0, 0.0).with_cell(1).with_depth(0.5),
        ];
        let stats = batch.pack(&sprites, &img).unwrap();
        assert_eq!(stats.vertices, 10);

        let r = batch.records(&stats);
        assert_eq!(r[4], r[3]);
        assert_eq!(r[5], r[6]);
        assert_eq!(r[6].translate, [40.0, 0.0, 0.5]);
        assert_eq!(r[6].tex, [0.5, 0.0]);
    }

    #[test]
    fn cell_index_uses_sprite_image_and_wraps() {
        let img = sheet(4, 8);
        let mut batch = SpriteBatchBuilder::new(1, OverflowPolicy::Truncate);
        let stats = batch
            .pack(&[SpriteDescriptor::new(&img, 0.0, 0.0).with_cell(6)], &img)
            .unwrap();
        // 4 cells: 6 wraps to 2
        assert_eq!(batch.records(&stats)[0].tex, [0.5, 0.0]);
    }

    #[test]
    fn empty_batch_draws_nothing_and_keeps_state() {
        let img = sheet(1, 8);
        let mut fx = Fixture::new();
        let mut batch = SpriteBatchBuilder::new(8, OverflowPolicy::Truncate);

        let stats = fx.draw(&mut batch, &[], &img).unwrap();
        assert_eq!(stats, BatchStats::default());
        assert!(fx.device.commands().is_empty());
        assert_eq!(fx.state.active(), None);
    }

    #[test]
    fn batch_is_one_draw_covering_every_record() {
        let img = sheet(2, 16);
        let mut fx = Fixture::new();
        let mut batch = SpriteBatchBuilder::new(64, OverflowPolicy::Truncate);
        let sprites: Vec<_> = (0..5)
            .map(|i| SpriteDescriptor::new(&img, i as f32 * 10.0, 0.0))
            .collect();

        let stats = fx.draw(&mut batch, &sprites, &img).unwrap();
        assert_eq!(fx.device.draw_calls(), vec![28]);
        assert_eq!(fx.device.stream(0).map(<[f32]>::len), Some(28 * 11));
        assert_eq!(stats.sprites, 5);
    }

    #[test]
    fn truncation_draws_the_cap_and_reports_the_rest() {
        let img = sheet(1, 8);
        let mut fx = Fixture::new();
        let mut batch = SpriteBatchBuilder::new(3, OverflowPolicy::Truncate);
        let sprites = vec![SpriteDescriptor::new(&img, 0.0, 0.0); 5];

        let stats = fx.draw(&mut batch, &sprites, &img).unwrap();
        assert_eq!(stats, BatchStats { sprites: 3, dropped: 2, vertices: 16 });
        assert_eq!(fx.device.draw_calls(), vec![16]);
    }

    #[test]
    fn reject_policy_fails_before_touching_the_device() {
        let img = sheet(1, 8);
        let mut fx = Fixture::new();
        let mut batch = SpriteBatchBuilder::new(2, OverflowPolicy::Reject);
        let sprites = vec![SpriteDescriptor::new(&img, 0.0, 0.0); 3];

        let err = fx.draw(&mut batch, &sprites, &img).unwrap_err();
        assert!(matches!(err, RenderError::BatchOverflow { requested: 3, max: 2 }));
        assert!(fx.device.commands().is_empty());
    }

    #[test]
    fn projection_and_sampler_are_set_only_on_upload() {
        let img = sheet(1, 8);
        let mut fx = Fixture::new();
        let mut batch = SpriteBatchBuilder::new(4, OverflowPolicy::Truncate);
        let sprites = [SpriteDescriptor::new(&img, 1.0, 1.0)];

        fx.draw(&mut batch, &sprites, &img).unwrap();
        fx.draw(&mut batch, &sprites, &img).unwrap();

        let program = fx.programs.get(ProgramKind::BatchImage);
        let projection = program.projection.unwrap();
        let sets = fx.device.count(|c| {
            matches!(c, crate::device::DeviceCommand::SetUniform(u, _) if *u == projection)
        });
        assert_eq!(sets, 1);
        assert_eq!(fx.device.upload_count(), 1);
        assert_eq!(
            fx.device.uniform(projection),
            Some(UniformValue::Mat3(make_projection(800.0, 600.0)))
        );
    }
}
