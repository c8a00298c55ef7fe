//! Per-frame draw packets, their ordering and instanced batching

use std::cmp::Ordering;
use std::ops::Range;

use glam::Mat4;

use crate::backend::{ShaderId, VertexArrayId};
use crate::math::Aabb;
use crate::resources::{MaterialHandle, MeshHandle};

/// Identity that decides whether two packets can share one instanced draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchKey {
    pub vertex_array: VertexArrayId,
    pub shader: ShaderId,
}

/// One visible draw request, valid for the frame it was submitted in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCommandPacket {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub key: BatchKey,
    pub index_count: u32,
    pub transform: Mat4,
    pub world_aabb: Aabb,
    /// Squared distance from the camera to the world AABB center
    pub distance_sq: f32,
}

/// Opaque and transparent packet lists for one frame
#[derive(Debug, Default)]
pub struct RenderQueue {
    opaque: Vec<RenderCommandPacket>,
    transparent: Vec<RenderCommandPacket>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.opaque.clear();
        self.transparent.clear();
    }

    pub fn push(&mut self, packet: RenderCommandPacket, transparent: bool) {
        if transparent {
            self.transparent.push(packet);
        } else {
            self.opaque.push(packet);
        }
    }

    pub fn opaque(&self) -> &[RenderCommandPacket] {
        &self.opaque
    }

    pub fn transparent(&self) -> &[RenderCommandPacket] {
        &self.transparent
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Opaque: grouped by shader, then mesh, then front to back.
    /// Transparent: back to front. Both sorts are stable.
    pub fn sort(&mut self) {
        self.opaque.sort_by(compare_opaque);
        self.transparent
            .sort_by(|a, b| b.distance_sq.total_cmp(&a.distance_sq));
    }
}

fn compare_opaque(a: &RenderCommandPacket, b: &RenderCommandPacket) -> Ordering {
    a.key
        .shader
        .cmp(&b.key.shader)
        .then(a.key.vertex_array.cmp(&b.key.vertex_array))
        .then(a.distance_sq.total_cmp(&b.distance_sq))
}

/// Split a sorted packet list into instanced batches.
///
/// A batch extends while `key` matches the batch's first packet and the
/// batch holds fewer than `max_instances` packets.
pub fn build_batches<K, F>(
    packets: &[RenderCommandPacket],
    max_instances: usize,
    key: F,
) -> Vec<Range<usize>>
where
    K: PartialEq,
    F: Fn(&RenderCommandPacket) -> K,
{
    assert!(max_instances > 0, "max_instances must be positive");

    let mut batches = Vec::new();
    if packets.is_empty() {
        return batches;
    }

    let mut start = 0;
    let mut start_key = key(&packets[0]);
    for (i, packet) in packets.iter().enumerate().skip(1) {
        let packet_key = key(packet);
        if packet_key != start_key || i - start >= max_instances {
            batches.push(start..i);
            start = i;
            start_key = packet_key;
        }
    }
    batches.push(start..packets.len());
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn make_packet(vao: u32, shader: u32, distance_sq: f32) -> RenderCommandPacket {
        RenderCommandPacket {
            mesh: MeshHandle::from(KeyData::from_ffi(1)),
            material: MaterialHandle::from(KeyData::from_ffi(1)),
            key: BatchKey {
                vertex_array: VertexArrayId::from_raw(vao),
                shader: ShaderId::from_raw(shader),
            },
            index_count: 36,
            transform: Mat4::IDENTITY,
            world_aabb: Aabb::default(),
            distance_sq,
        }
    }

    #[test]
    fn test_opaque_sort_groups_shader_then_distance() {
        let mut queue = RenderQueue::new();
        queue.push(make_packet(1, 2, 5.0), false);
        queue.push(make_packet(1, 1, 9.0), false);
        queue.push(make_packet(1, 2, 1.0), false);
        queue.push(make_packet(1, 1, 3.0), false);
        queue.sort();

        let order: Vec<_> = queue
            .opaque()
            .iter()
            .map(|p| (p.key.shader.raw(), p.distance_sq))
            .collect();
        assert_eq!(order, vec![(1, 3.0), (1, 9.0), (2, 1.0), (2, 5.0)]);
    }

    #[test]
    fn test_transparent_sort_back_to_front() {
        let mut queue = RenderQueue::new();
        for d in [4.0, 16.0, 1.0, 9.0] {
            queue.push(make_packet(1, 1, d), true);
        }
        queue.sort();
        let order: Vec<_> = queue.transparent().iter().map(|p| p.distance_sq).collect();
        assert_eq!(order, vec![16.0, 9.0, 4.0, 1.0]);
    }

    #[test]
    fn test_batches_split_on_key_change() {
        let packets = [
            make_packet(1, 1, 0.0),
            make_packet(1, 1, 0.0),
            make_packet(2, 1, 0.0),
            make_packet(1, 1, 0.0),
        ];
        let batches = build_batches(&packets, 100, |p| p.key);
        assert_eq!(batches, vec![0..2, 2..3, 3..4]);
    }

    #[test]
    fn test_batches_split_at_capacity() {
        let packets = vec![make_packet(1, 1, 0.0); 7];
        let batches = build_batches(&packets, 3, |p| p.key);
        assert_eq!(batches, vec![0..3, 3..6, 6..7]);
    }

    #[test]
    fn test_empty_queue_has_no_batches() {
        assert!(build_batches(&[], 10, |p| p.key).is_empty());
    }

    #[test]
    fn test_single_packet_tail_is_flushed() {
        let packets = [make_packet(3, 3, 0.0)];
        assert_eq!(build_batches(&packets, 10, |p| p.key), vec![0..1]);
    }
}
