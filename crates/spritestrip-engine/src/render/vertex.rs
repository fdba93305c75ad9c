use bytemuck::{Pod, Zeroable};

/// One batch vertex: 11 floats consumed as `aPosition` (local + tex),
/// `aTransform` (rotation + scale) and `aTranslate` (position + depth).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct BatchVertex {
    pub local: [f32; 2],
    pub tex: [f32; 2],
    /// `[-cos(angle), sin(angle)]`
    pub rotation: [f32; 2],
    pub scale: [f32; 2],
    pub translate: [f32; 3],
}

const _: () = assert!(std::mem::size_of::<BatchVertex>() == 11 * 4);

/// Single-image vertex: local offset and texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ImageVertex {
    pub local: [f32; 2],
    pub tex: [f32; 2],
}

/// Fixed-capacity vertex storage, allocated once and overwritten in place.
pub struct VertexArena<V> {
    records: Box<[V]>,
}

impl<V: Pod> VertexArena<V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: vec![V::zeroed(); capacity].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Writer starting at record 0.
    pub fn writer(&mut self) -> VertexWriter<'_, V> {
        VertexWriter {
            records: &mut self.records,
            len: 0,
        }
    }

    /// The first `len` records.
    #[inline]
    pub fn records(&self, len: usize) -> &[V] {
        &self.records[..len.min(self.records.len())]
    }

    /// The first `len` records as raw floats, ready for a vertex stream.
    #[inline]
    pub fn as_floats(&self, len: usize) -> &[f32] {
        bytemuck::cast_slice(self.records(len))
    }
}

/// Sequential writer over a [`VertexArena`].
pub struct VertexWriter<'a, V> {
    records: &'a mut [V],
    len: usize,
}

impl<V: Copy> VertexWriter<'_, V> {
    /// Appends `vertex`. Writes past capacity are dropped.
    #[inline]
    pub fn push(&mut self, vertex: V) {
        debug_assert!(self.len < self.records.len(), "vertex arena overflow");
        if let Some(slot) = self.records.get_mut(self.len) {
            *slot = vertex;
            self.len += 1;
        }
    }

    /// Appends a copy of the last record; the first half of a strip join.
    #[inline]
    pub fn repeat_last(&mut self) {
        if let Some(last) = self.len.checked_sub(1).map(|i| self.records[i]) {
            self.push(last);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_vertex_floats_follow_attribute_order() {
        let mut arena = VertexArena::<BatchVertex>::with_capacity(1);
        let mut w = arena.writer();
        w.push(BatchVertex {
            local: [1.0, 2.0],
            tex: [3.0, 4.0],
            rotation: [5.0, 6.0],
            scale: [7.0, 8.0],
            translate: [9.0, 10.0, 11.0],
        });
        let floats = arena.as_floats(1);
        let expected: Vec<f32> = (1..=11).map(|i| i as f32).collect();
        assert_eq!(floats, expected.as_slice());
    }

    #[test]
    fn repeat_last_duplicates_previous_record() {
        let mut arena = VertexArena::<ImageVertex>::with_capacity(4);
        let mut w = arena.writer();
        w.repeat_last();
        assert!(w.is_empty());

        let v = ImageVertex { local: [1.0, 1.0], tex: [0.5, 0.5] };
        w.push(v);
        w.repeat_last();
        assert_eq!(w.len(), 2);
        assert_eq!(arena.records(2), &[v, v]);
    }

    #[test]
    fn arena_never_grows() {
        let mut arena = VertexArena::<ImageVertex>::with_capacity(3);
        assert_eq!(arena.capacity(), 3);
        let _ = arena.writer();
        assert_eq!(arena.capacity(), 3);
        assert_eq!(arena.records(10).len(), 3);
    }
}
