//! Per-pass render queues filled from the proximity snapshot

use crate::core::camera::Camera;
use crate::render::drain::{RenderPass, RenderQueue, camera_relative};
use crate::render::ordering::ChunkOrderingPolicy;
use crate::world::chunk::{CHUNK_SIZE, RenderPhase};
use crate::world::proximity::{ChunkHandle, ProximitySnapshot};

/// One queue per chunk pass
#[derive(Debug, Default)]
pub struct RenderQueues {
    pub opaque: RenderQueue,
    pub alpha_reject: RenderQueue,
    pub alpha_blend: RenderQueue,
}

impl RenderQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distribute the snapshot over the pass queues.
    ///
    /// Dead handles and chunks without a mesh go to the opaque queue only, so
    /// the opaque pass counts them as not ready once per frame. Opaque and
    /// alpha-reject keep snapshot order (front to back); alpha-blend is
    /// re-sorted back to front. Returns the number of chunks culled.
    pub fn fill(&mut self, snapshot: &ProximitySnapshot, camera: &dyn Camera, frustum_culling: bool) -> u32 {
        self.clear();

        let camera_position = camera.position();
        let frustum = if frustum_culling { camera.frustum() } else { None };
        let extent = CHUNK_SIZE.as_vec3();
        let mut culled = 0;

        for handle in snapshot.iter() {
            let Some(mesh) = handle.upgrade().and_then(|chunk| chunk.mesh()) else {
                self.opaque.push_back(handle.clone());
                continue;
            };

            if let Some(frustum) = &frustum {
                let min = camera_relative(handle.coord().world_origin(), camera_position);
                if !frustum.intersects_box(min, min + extent) {
                    culled += 1;
                    continue;
                }
            }

            if mesh.has_phase(RenderPhase::Opaque) {
                self.opaque.push_back(handle.clone());
            }
            if mesh.has_phase(RenderPhase::AlphaReject) {
                self.alpha_reject.push_back(handle.clone());
            }
            if mesh.has_phase(RenderPhase::AlphaBlend) {
                self.alpha_blend.push_back(handle.clone());
            }
        }

        ChunkOrderingPolicy::back_to_front(camera_position)
            .sort_by_coord(self.alpha_blend.make_contiguous(), ChunkHandle::coord);

        culled
    }

    pub fn queue_mut(&mut self, pass: RenderPass) -> &mut RenderQueue {
        match pass {
            RenderPass::Opaque => &mut self.opaque,
            RenderPass::AlphaReject => &mut self.alpha_reject,
            RenderPass::AlphaBlend => &mut self.alpha_blend,
        }
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.alpha_reject.len() + self.alpha_blend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.opaque.clear();
        self.alpha_reject.clear();
        self.alpha_blend.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::{NullCamera, PerspectiveCamera};
    use crate::core::types::DVec3;
    use crate::world::chunk::{Chunk, ChunkCoord, ChunkMesh};
    use std::sync::Arc;

    fn chunk(x: i32, z: i32, mesh: Option<ChunkMesh>) -> Arc<Chunk> {
        let coord = ChunkCoord::new(x, 0, z);
        Arc::new(match mesh {
            Some(mesh) => Chunk::with_mesh(coord, mesh),
            None => Chunk::new(coord),
        })
    }

    fn coords(queue: &RenderQueue) -> Vec<ChunkCoord> {
        queue.iter().map(ChunkHandle::coord).collect()
    }

    #[test]
    fn test_fill_routes_by_phase() {
        let solid = chunk(0, 0, Some(ChunkMesh::new().with_phase(RenderPhase::Opaque, 1, 10)));
        let leafy = chunk(1, 0, Some(
            ChunkMesh::new()
                .with_phase(RenderPhase::Opaque, 2, 10)
                .with_phase(RenderPhase::AlphaReject, 3, 4),
        ));
        let unmeshed = chunk(2, 0, None);
        let snapshot = ProximitySnapshot::new(
            [&solid, &leafy, &unmeshed].into_iter().map(ChunkHandle::new).collect(),
            DVec3::ZERO,
        );

        let mut queues = RenderQueues::new();
        let culled = queues.fill(&snapshot, &NullCamera::new(DVec3::ZERO), true);

        assert_eq!(culled, 0);
        assert_eq!(coords(&queues.opaque), vec![solid.coord(), leafy.coord(), unmeshed.coord()]);
        assert_eq!(coords(&queues.alpha_reject), vec![leafy.coord()]);
        assert!(queues.alpha_blend.is_empty());
    }

    #[test]
    fn test_dead_handle_counted_once() {
        let live = chunk(0, 0, Some(ChunkMesh::new().with_phase(RenderPhase::AlphaBlend, 1, 2)));
        let handles = {
            let dead = chunk(3, 0, Some(ChunkMesh::new().with_phase(RenderPhase::AlphaBlend, 2, 2)));
            vec![ChunkHandle::new(&live), ChunkHandle::new(&dead)]
        };
        let snapshot = ProximitySnapshot::new(handles, DVec3::ZERO);

        let mut queues = RenderQueues::new();
        queues.fill(&snapshot, &NullCamera::default(), false);

        assert_eq!(coords(&queues.opaque), vec![ChunkCoord::new(3, 0, 0)]);
        assert_eq!(coords(&queues.alpha_blend), vec![live.coord()]);
        assert_eq!(queues.len(), 2);
    }

    #[test]
    fn test_alpha_blend_back_to_front() {
        let blend = || Some(ChunkMesh::new().with_phase(RenderPhase::AlphaBlend, 1, 6));
        let near = chunk(0, 0, blend());
        let mid = chunk(2, 0, blend());
        let far = chunk(5, 0, blend());
        let snapshot = ProximitySnapshot::new(
            [&near, &mid, &far].into_iter().map(ChunkHandle::new).collect(),
            DVec3::ZERO,
        );

        let mut queues = RenderQueues::new();
        queues.fill(&snapshot, &NullCamera::new(DVec3::new(16.0, 0.0, 16.0)), false);

        assert_eq!(coords(&queues.alpha_blend), vec![far.coord(), mid.coord(), near.coord()]);
    }

    #[test]
    fn test_frustum_culls_behind_camera() {
        let opaque = || Some(ChunkMesh::new().with_phase(RenderPhase::Opaque, 1, 12));
        // Default rotation looks down -Z
        let ahead = chunk(0, -3, opaque());
        let behind = chunk(0, 3, opaque());
        let snapshot = ProximitySnapshot::new(
            [&ahead, &behind].into_iter().map(ChunkHandle::new).collect(),
            DVec3::ZERO,
        );
        let camera = PerspectiveCamera::new(DVec3::new(16.0, 32.0, 0.0), 70.0, 1.0);

        let mut queues = RenderQueues::new();
        assert_eq!(queues.fill(&snapshot, &camera, true), 1);
        assert_eq!(coords(&queues.opaque), vec![ahead.coord()]);

        assert_eq!(queues.fill(&snapshot, &camera, false), 0);
        assert_eq!(queues.opaque.len(), 2);
    }

    #[test]
    fn test_queue_mut_and_clear() {
        let c = chunk(0, 0, None);
        let mut queues = RenderQueues::new();
        queues.queue_mut(RenderPass::AlphaBlend).push_back(ChunkHandle::new(&c));
        assert_eq!(queues.alpha_blend.len(), 1);
        queues.clear();
        assert!(queues.is_empty());
    }
}
