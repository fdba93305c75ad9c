use crate::device::{DeviceContext, UniformValue};
use crate::error::Result;
use crate::math::transform::{make_projection, model_matrix};
use crate::sprite::SpriteImage;

use super::program::{ProgramKind, ProgramRegistry};
use super::state::RenderStateMachine;
use super::texture::TextureCache;
use super::vertex::ImageVertex;

/// Quad for cell 0 of `image`, centered on the origin, in strip order
/// left-bottom, left-top, right-bottom, right-top.
pub fn image_quad(image: &SpriteImage) -> [ImageVertex; 4] {
    let cell = image.cell_bounds(0);
    let (hw, hh) = image.half_cell_extents();
    [
        ImageVertex { local: [-hw, hh], tex: [cell.x, cell.bottom()] },
        ImageVertex { local: [-hw, -hh], tex: [cell.x, cell.y] },
        ImageVertex { local: [hw, hh], tex: [cell.right(), cell.bottom()] },
        ImageVertex { local: [hw, -hh], tex: [cell.right(), cell.y] },
    ]
}

/// Draws one image with its own model matrix.
#[derive(Debug, Default)]
pub struct SingleImageDrawer;

impl SingleImageDrawer {
    #[allow(clippy::too_many_arguments)]
    pub fn draw_image<D: DeviceContext>(
        &self,
        device: &mut D,
        programs: &ProgramRegistry,
        state: &mut RenderStateMachine,
        textures: &mut TextureCache,
        x: f32,
        y: f32,
        image: &SpriteImage,
        angle: f32,
        scale: f32,
    ) -> Result<()> {
        state.activate(device, programs, textures, ProgramKind::SingleImage);
        let program = programs.get(ProgramKind::SingleImage);

        if textures.ensure_bound(device, image)?.uploaded {
            let vp = device.drawing_buffer_size();
            if let Some(sampler) = program.sampler {
                device.set_uniform(sampler, UniformValue::Sampler(0));
            }
            if let Some(projection) = program.projection {
                device.set_uniform(projection, UniformValue::Mat3(make_projection(vp.width, vp.height)));
            }
        }

        let quad = image_quad(image);
        device.write_vertex_stream(0, bytemuck::cast_slice(&quad));
        if let Some(model) = program.model {
            device.set_uniform(model, UniformValue::Mat3(model_matrix(x, y, angle, scale)));
        }
        device.draw_triangle_strip(4);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCommand, HeadlessDevice};
    use crate::math::transform::make_translation;

    fn sheet() -> SpriteImage {
        SpriteImage::from_sheet(64, 32, vec![0u8; 64 * 32 * 4], 32, 32).unwrap()
    }

    #[test]
    fn quad_maps_corners_to_first_cell() {
        let q = image_quad(&sheet());
        assert_eq!(q[0], ImageVertex { local: [-16.0, 16.0], tex: [0.0, 1.0] });
        assert_eq!(q[1], ImageVertex { local: [-16.0, -16.0], tex: [0.0, 0.0] });
        assert_eq!(q[2], ImageVertex { local: [16.0, 16.0], tex: [0.5, 1.0] });
        assert_eq!(q[3], ImageVertex { local: [16.0, -16.0], tex: [0.5, 0.0] });
    }

    #[test]
    fn draw_image_sets_model_and_draws_four() {
        let mut device = HeadlessDevice::new(320, 240);
        let programs = ProgramRegistry::new(&mut device).unwrap();
        let mut state = RenderStateMachine::new();
        let mut textures = TextureCache::new();
        let img = sheet();

        SingleImageDrawer
            .draw_image(&mut device, &programs, &mut state, &mut textures, 10.0, 20.0, &img, 0.0, 1.0)
            .unwrap();

        let program = programs.get(ProgramKind::SingleImage);
        assert_eq!(
            device.uniform(program.model.unwrap()),
            Some(UniformValue::Mat3(make_translation(10.0, 20.0)))
        );
        assert_eq!(device.uniform(program.sampler.unwrap()), Some(UniformValue::Sampler(0)));
        assert_eq!(device.draw_calls(), vec![4]);
        assert_eq!(device.stream(0).map(<[f32]>::len), Some(16));
    }

    #[test]
    fn projection_is_rebound_only_when_the_texture_changes() {
        let mut device = HeadlessDevice::new(320, 240);
        let programs = ProgramRegistry::new(&mut device).unwrap();
        let mut state = RenderStateMachine::new();
        let mut textures = TextureCache::new();
        let first = sheet();
        let second = sheet();

        let mut draw = |device: &mut HeadlessDevice, img: &SpriteImage| {
            SingleImageDrawer
                .draw_image(device, &programs, &mut state, &mut textures, 0.0, 0.0, img, 0.0, 1.0)
                .unwrap();
        };
        let projection = programs.get(ProgramKind::SingleImage).projection.unwrap();
        let projection_sets = |device: &HeadlessDevice| {
            device.count(|c| matches!(c, DeviceCommand::SetUniform(u, _) if *u == projection))
        };

        draw(&mut device, &first);
        assert_eq!(
            device.uniform(projection),
            Some(UniformValue::Mat3(make_projection(320.0, 240.0)))
        );
        assert_eq!(projection_sets(&device), 1);

        draw(&mut device, &first);
        assert_eq!(projection_sets(&device), 1);

        draw(&mut device, &second);
        assert_eq!(projection_sets(&device), 2);
        assert_eq!(device.draw_calls(), vec![4, 4, 4]);
    }
}
