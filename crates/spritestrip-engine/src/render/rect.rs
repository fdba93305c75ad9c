use crate::coords::ColorRgba;
use crate::device::{DeviceContext, UniformValue};

use super::program::{ProgramKind, ProgramRegistry};
use super::state::RenderStateMachine;
use super::texture::TextureCache;

/// Corner positions and per-vertex colors of a filled rectangle, in strip order
/// (top-left, top-right, bottom-left, bottom-right).
pub fn solid_quad(x: f32, y: f32, width: f32, height: f32, color: ColorRgba) -> ([f32; 8], [f32; 16]) {
    let (x2, y2) = (x + width, y + height);
    let positions = [x, y, x2, y, x, y2, x2, y2];

    let c = color.to_array();
    let mut colors = [0.0; 16];
    for chunk in colors.chunks_exact_mut(4) {
        chunk.copy_from_slice(&c);
    }
    (positions, colors)
}

/// Draws solid rectangles in pixel space. Nothing is cached between calls.
#[derive(Debug, Default)]
pub struct SolidRectDrawer;

impl SolidRectDrawer {
    #[allow(clippy::too_many_arguments)]
    pub fn fill_rect<D: DeviceContext>(
        &self,
        device: &mut D,
        programs: &ProgramRegistry,
        state: &mut RenderStateMachine,
        textures: &mut TextureCache,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: ColorRgba,
    ) {
        state.activate(device, programs, textures, ProgramKind::Solid);

        let (positions, colors) = solid_quad(x, y, width, height, color);
        let vp = device.drawing_buffer_size().non_degenerate();
        if let Some(resolution) = programs.get(ProgramKind::Solid).resolution {
            device.set_uniform(resolution, UniformValue::Vec2([vp.width, vp.height]));
        }

        device.write_vertex_stream(0, &positions);
        device.write_vertex_stream(1, &colors);
        device.draw_triangle_strip(4);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;

    #[test]
    fn quad_corners_and_color() {
        let red = ColorRgba::red();
        let (positions, colors) = solid_quad(0.0, 0.0, 10.0, 10.0, red);
        assert_eq!(positions, [0.0, 0.0, 10.0, 0.0, 0.0, 10.0, 10.0, 10.0]);
        assert!(colors.chunks_exact(4).all(|c| c == red.to_array()));
    }

    #[test]
    fn fill_rect_uploads_two_streams_and_draws_four() {
        let mut device = HeadlessDevice::new(200, 100);
        let programs = ProgramRegistry::new(&mut device).unwrap();
        let mut state = RenderStateMachine::new();
        let mut textures = TextureCache::new();

        SolidRectDrawer.fill_rect(
            &mut device,
            &programs,
            &mut state,
            &mut textures,
            5.0,
            5.0,
            20.0,
            10.0,
            ColorRgba::black(),
        );

        assert_eq!(device.draw_calls(), vec![4]);
        assert_eq!(device.stream(0).map(<[f32]>::len), Some(8));
        assert_eq!(device.stream(1).map(<[f32]>::len), Some(16));

        let resolution = programs.get(ProgramKind::Solid).resolution.unwrap();
        assert_eq!(device.uniform(resolution), Some(UniformValue::Vec2([200.0, 100.0])));
        assert_eq!(state.active(), Some(ProgramKind::Solid));
    }
}
