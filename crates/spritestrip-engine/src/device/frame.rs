use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::coords::ColorRgba;

use super::ProgramHandle;

/// A single acquired surface frame.
///
/// Short-lived: holding the surface texture blocks acquisition of the next one.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// Vertex buffer slots a program may read.
pub(crate) const MAX_STREAMS: usize = 2;

/// Uniform block shared by all three shaders (`Uniforms` in the WGSL).
///
/// `mat3x3<f32>` columns are 16-byte aligned, hence the padded columns.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
pub(crate) struct UniformBlock {
    pub projection: [[f32; 4]; 3],
    pub model: [[f32; 4]; 3],
    pub resolution: [f32; 2],
    pub _pad: [f32; 2],
}

const _: () = assert!(std::mem::size_of::<UniformBlock>() == 112);

impl UniformBlock {
    pub(crate) const SIZE: u64 = std::mem::size_of::<UniformBlock>() as u64;
}

/// One recorded draw, replayed at the end of the frame.
#[derive(Debug, Clone)]
pub(crate) struct RecordedDraw<T> {
    pub program: ProgramHandle,
    pub texture: Option<T>,
    pub streams: [Option<Range<u64>>; MAX_STREAMS],
    pub uniform_offset: u32,
    pub vertex_count: u32,
}

/// Frame-long staging of draws.
///
/// Vertex data is copied out at draw time, so callers may overwrite their
/// buffers right after a draw; uniforms are snapshotted per draw at
/// `uniform_stride` offsets for dynamic binding. Neither staging area grows
/// past `byte_limit`, the largest buffer the device can create.
pub(crate) struct FrameRecorder<T> {
    clear: ColorRgba,
    byte_limit: u64,
    vertex_bytes: Vec<u8>,
    uniform_bytes: Vec<u8>,
    uniform_stride: usize,
    streams: [Option<Range<u64>>; MAX_STREAMS],
    draws: Vec<RecordedDraw<T>>,
}

impl<T: Clone> FrameRecorder<T> {
    /// `uniform_alignment` is the device's minimum dynamic offset alignment.
    pub(crate) fn new(uniform_alignment: usize, byte_limit: u64) -> Self {
        Self {
            clear: ColorRgba::black(),
            byte_limit,
            vertex_bytes: Vec::new(),
            uniform_bytes: Vec::new(),
            uniform_stride: align_up(UniformBlock::SIZE as usize, uniform_alignment.max(1)),
            streams: Default::default(),
            draws: Vec::new(),
        }
    }

    /// Starts a new frame. Staging capacity is kept.
    pub(crate) fn begin(&mut self, clear: ColorRgba) {
        self.clear = clear;
        self.vertex_bytes.clear();
        self.uniform_bytes.clear();
        self.streams = Default::default();
        self.draws.clear();
    }

    /// Copies `data` into the frame. Data that would push the frame past the
    /// byte limit is dropped and leaves the stream unbound.
    pub(crate) fn write_stream(&mut self, stream: u32, data: &[f32]) {
        let Some(slot) = self.streams.get_mut(stream as usize) else {
            log::warn!("vertex stream {stream} out of range; ignored");
            return;
        };
        let start = self.vertex_bytes.len() as u64;
        let end = start + std::mem::size_of_val(data) as u64;
        if end > self.byte_limit {
            log::error!(
                "frame vertex data would reach {end} bytes (limit {}); stream {stream} dropped",
                self.byte_limit
            );
            *slot = None;
            return;
        }
        self.vertex_bytes.extend_from_slice(bytemuck::cast_slice(data));
        *slot = Some(start..self.vertex_bytes.len() as u64);
    }

    pub(crate) fn clear_streams(&mut self) {
        self.streams = Default::default();
    }

    pub(crate) fn stream_bound(&self, stream: usize) -> bool {
        self.streams.get(stream).is_some_and(Option::is_some)
    }

    /// Returns false when the frame has no room left for another uniform
    /// snapshot; the draw is not recorded.
    pub(crate) fn push_draw(
        &mut self,
        program: ProgramHandle,
        texture: Option<T>,
        uniforms: &UniformBlock,
        vertex_count: u32,
    ) -> bool {
        let uniform_offset = self.uniform_bytes.len();
        if (uniform_offset + self.uniform_stride) as u64 > self.byte_limit {
            log::error!("frame uniform data at limit ({} bytes); draw dropped", self.byte_limit);
            return false;
        }
        self.uniform_bytes.extend_from_slice(bytemuck::bytes_of(uniforms));
        self.uniform_bytes.resize(uniform_offset + self.uniform_stride, 0);

        self.draws.push(RecordedDraw {
            program,
            texture,
            streams: self.streams.clone(),
            uniform_offset: uniform_offset as u32,
            vertex_count,
        });
        true
    }

    pub(crate) fn clear_color(&self) -> ColorRgba {
        self.clear
    }

    pub(crate) fn draws(&self) -> &[RecordedDraw<T>] {
        &self.draws
    }

    pub(crate) fn vertex_bytes(&self) -> &[u8] {
        &self.vertex_bytes
    }

    pub(crate) fn uniform_bytes(&self) -> &[u8] {
        &self.uniform_bytes
    }
}

/// New capacity for a staging buffer that must hold `required` bytes, or
/// `None` when `current` already does. Grows by powers of two, clamped to
/// `max`; callers keep `required` within `max`.
pub(crate) fn grown_capacity(required: u64, current: u64, max: u64) -> Option<u64> {
    if required <= current {
        return None;
    }
    Some(required.next_power_of_two().min(max))
}

#[inline]
pub(crate) fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = 1 << 28;

    #[test]
    fn uniform_snapshots_respect_alignment() {
        let mut rec = FrameRecorder::<u32>::new(256, LIMIT);
        rec.begin(ColorRgba::black());
        rec.write_stream(0, &[0.0; 8]);
        rec.push_draw(ProgramHandle(0), None, &UniformBlock::default(), 4);
        rec.push_draw(ProgramHandle(0), None, &UniformBlock::default(), 4);

        let offsets: Vec<u32> = rec.draws().iter().map(|d| d.uniform_offset).collect();
        assert_eq!(offsets, vec![0, 256]);
        assert_eq!(rec.uniform_bytes().len(), 512);
    }

    #[test]
    fn draws_keep_the_stream_ranges_they_saw() {
        let mut rec = FrameRecorder::<u32>::new(64, LIMIT);
        rec.begin(ColorRgba::black());

        rec.write_stream(0, &[1.0, 2.0]);
        rec.write_stream(1, &[0.5; 4]);
        rec.push_draw(ProgramHandle(0), Some(7), &UniformBlock::default(), 4);

        rec.write_stream(0, &[3.0; 3]);
        rec.push_draw(ProgramHandle(1), Some(7), &UniformBlock::default(), 3);

        let draws = rec.draws();
        assert_eq!(draws[0].streams[0], Some(0..8));
        assert_eq!(draws[0].streams[1], Some(8..24));
        assert_eq!(draws[1].streams[0], Some(24..36));
        assert_eq!(rec.vertex_bytes().len(), 36);
    }

    #[test]
    fn begin_discards_previous_frame() {
        let mut rec = FrameRecorder::<u32>::new(256, LIMIT);
        rec.begin(ColorRgba::black());
        rec.write_stream(0, &[1.0]);
        rec.push_draw(ProgramHandle(0), None, &UniformBlock::default(), 4);

        rec.begin(ColorRgba::red());
        assert!(rec.draws().is_empty());
        assert!(!rec.stream_bound(0));
        assert_eq!(rec.clear_color(), ColorRgba::red());
    }

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(112, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(112, 16), 112);
    }

    #[test]
    fn staging_never_exceeds_the_buffer_limit() {
        // ten full batches fit exactly; the eleventh is refused
        let batch = vec![0.0f32; 1024];
        let batch_bytes = std::mem::size_of_val(batch.as_slice()) as u64;
        let mut rec = FrameRecorder::<u32>::new(256, 10 * batch_bytes + 256 * 10);
        rec.begin(ColorRgba::black());

        let mut recorded = 0;
        for _ in 0..11 {
            rec.write_stream(0, &batch);
            if rec.stream_bound(0) && rec.push_draw(ProgramHandle(0), None, &UniformBlock::default(), 4) {
                recorded += 1;
            }
        }

        assert_eq!(recorded, 10);
        assert_eq!(rec.vertex_bytes().len() as u64, 10 * batch_bytes);
        assert!(!rec.stream_bound(0));
    }

    #[test]
    fn uniform_snapshots_stop_at_the_limit() {
        let mut rec = FrameRecorder::<u32>::new(256, 512);
        rec.begin(ColorRgba::black());
        rec.write_stream(0, &[0.0; 4]);

        assert!(rec.push_draw(ProgramHandle(0), None, &UniformBlock::default(), 4));
        assert!(rec.push_draw(ProgramHandle(0), None, &UniformBlock::default(), 4));
        assert!(!rec.push_draw(ProgramHandle(0), None, &UniformBlock::default(), 4));
        assert_eq!(rec.draws().len(), 2);
    }

    #[test]
    fn growth_is_clamped_to_the_device_maximum() {
        let max = 268_435_456;
        assert_eq!(grown_capacity(1000, 4096, max), None);
        assert_eq!(grown_capacity(5000, 4096, max), Some(8192));
        // 200 MB rounds up to 256 MiB, which is the maximum
        assert_eq!(grown_capacity(200_000_000, 65_536, max), Some(max));
        assert_eq!(grown_capacity(150_000_000, 65_536, 200_000_000), Some(200_000_000));
    }
}
