//! Render-queue draining shared by every chunk pass.
//!
//! Each pass binds its global state once, pops chunks off its queue, draws
//! the ones that are ready, and publishes what it did. Only the pass
//! descriptor differs between passes.

use std::collections::VecDeque;
use std::ops::BitOr;

use crate::core::camera::Camera;
use crate::core::types::{DVec3, Vec3};
use crate::render::ordering::Direction;
use crate::render::stats::{PassStats, StatisticsSink};
use crate::render::uniforms::ChunkUniforms;
use crate::world::chunk::{Chunk, ChunkCoord, ChunkMesh, RenderPhase};
use crate::world::proximity::ChunkHandle;

/// Queue of chunks waiting to be drawn by one pass
pub type RenderQueue = VecDeque<ChunkHandle>;

/// Chunk shader feature switches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ShaderFeatures(u32);

impl ShaderFeatures {
    pub const NONE: ShaderFeatures = ShaderFeatures(0);
    pub const ALPHA_REJECT: ShaderFeatures = ShaderFeatures(1 << 0);
    pub const BLEND: ShaderFeatures = ShaderFeatures(1 << 1);

    pub fn contains(self, other: ShaderFeatures) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for ShaderFeatures {
    type Output = ShaderFeatures;

    fn bitor(self, rhs: ShaderFeatures) -> ShaderFeatures {
        ShaderFeatures(self.0 | rhs.0)
    }
}

/// The chunk passes, in the order a frame runs them
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderPass {
    Opaque,
    AlphaReject,
    AlphaBlend,
}

impl RenderPass {
    pub const ALL: [RenderPass; 3] = [RenderPass::Opaque, RenderPass::AlphaReject, RenderPass::AlphaBlend];

    pub fn descriptor(self) -> PassDescriptor {
        match self {
            RenderPass::Opaque => PassDescriptor {
                name: "rendering/chunksOpaque",
                phase: RenderPhase::Opaque,
                features: ShaderFeatures::NONE,
                depth_write: true,
                order: Direction::FrontToBack,
            },
            // Fragments below the alpha threshold are discarded; the rest
            // write depth like opaque geometry. Foliage and plants.
            RenderPass::AlphaReject => PassDescriptor {
                name: "rendering/chunksAlphaReject",
                phase: RenderPhase::AlphaReject,
                features: ShaderFeatures::ALPHA_REJECT,
                depth_write: true,
                order: Direction::FrontToBack,
            },
            RenderPass::AlphaBlend => PassDescriptor {
                name: "rendering/chunksAlphaBlend",
                phase: RenderPhase::AlphaBlend,
                features: ShaderFeatures::BLEND,
                depth_write: false,
                order: Direction::BackToFront,
            },
        }
    }
}

/// Global state a pass binds before draining its queue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassDescriptor {
    /// Activity name for profiling
    pub name: &'static str,
    /// Mesh geometry drawn by the pass
    pub phase: RenderPhase,
    /// Shader features enabled for the duration of the pass
    pub features: ShaderFeatures,
    pub depth_write: bool,
    /// Order the pass's queue is filled in
    pub order: Direction,
}

/// One chunk draw handed to the backend
#[derive(Debug)]
pub struct ChunkDraw<'a> {
    pub coord: ChunkCoord,
    pub mesh: &'a ChunkMesh,
    pub phase: RenderPhase,
    pub uniforms: ChunkUniforms,
    /// Chunk origin relative to the camera
    pub translation: Vec3,
}

/// Frame-submission collaborator: the graphics layer that turns pass state
/// and chunk draws into API calls
pub trait ChunkDrawBackend {
    /// Bind the pass's global state (shader features, blending, depth)
    fn begin_pass(&mut self, pass: &PassDescriptor);

    /// Draw one chunk's geometry for the pass's phase
    fn draw_chunk(&mut self, draw: &ChunkDraw<'_>);

    /// Restore the state changed by `begin_pass`
    fn end_pass(&mut self, pass: &PassDescriptor);
}

/// Pop every chunk off `queue`. Dead handles and chunks without a mesh are
/// counted as not ready; the rest go to `on_chunk`, which returns the number
/// of triangles it drew.
pub fn drain_queue<F>(queue: &mut RenderQueue, mut on_chunk: F) -> PassStats
where
    F: FnMut(&Chunk, &ChunkMesh) -> u32,
{
    let mut stats = PassStats::default();
    while let Some(handle) = queue.pop_front() {
        let ready = handle
            .upgrade()
            .and_then(|chunk| chunk.mesh().map(|mesh| (chunk, mesh)));
        match ready {
            Some((chunk, mesh)) => {
                stats.triangles += on_chunk(&chunk, &mesh);
                stats.chunks_drawn += 1;
            }
            None => stats.not_ready += 1,
        }
    }
    stats
}

/// Chunk origin relative to the camera. Subtracted in f64 so large world
/// coordinates do not jitter once narrowed to f32.
pub fn camera_relative(origin: DVec3, camera_position: DVec3) -> Vec3 {
    (origin - camera_position).as_vec3()
}

/// Run one chunk pass over its queue and publish its statistics
pub fn render_pass(
    pass: RenderPass,
    queue: &mut RenderQueue,
    camera: &mut dyn Camera,
    backend: &mut dyn ChunkDrawBackend,
    sink: &mut dyn StatisticsSink,
) -> PassStats {
    let descriptor = pass.descriptor();
    let camera_position = camera.position();

    camera.look_through();
    backend.begin_pass(&descriptor);

    let stats = drain_queue(queue, |chunk, mesh| {
        let origin = chunk.world_origin();
        let draw = ChunkDraw {
            coord: chunk.coord(),
            mesh,
            phase: descriptor.phase,
            uniforms: ChunkUniforms::new(origin, chunk.is_animated()),
            translation: camera_relative(origin, camera_position),
        };
        backend.draw_chunk(&draw);
        mesh.triangle_count(descriptor.phase)
    });

    backend.end_pass(&descriptor);
    stats.publish(sink);

    log::trace!(
        "{}: {} chunks, {} triangles, {} not ready",
        descriptor.name,
        stats.chunks_drawn,
        stats.triangles,
        stats.not_ready
    );
    stats
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::camera::NullCamera;
    use crate::render::stats::RenderStatistics;
    use std::sync::Arc;

    /// Backend that records every call
    #[derive(Default)]
    pub(crate) struct RecordingBackend {
        pub calls: Vec<String>,
        pub draws: Vec<(ChunkCoord, RenderPhase, Vec3, ChunkUniforms)>,
    }

    impl ChunkDrawBackend for RecordingBackend {
        fn begin_pass(&mut self, pass: &PassDescriptor) {
            self.calls.push(format!("begin {}", pass.name));
        }

        fn draw_chunk(&mut self, draw: &ChunkDraw<'_>) {
            self.calls.push(format!("draw {:?}", draw.coord));
            self.draws.push((draw.coord, draw.phase, draw.translation, draw.uniforms));
        }

        fn end_pass(&mut self, pass: &PassDescriptor) {
            self.calls.push(format!("end {}", pass.name));
        }
    }

    fn meshed(x: i32, z: i32, triangles: u32) -> Arc<Chunk> {
        Arc::new(Chunk::with_mesh(
            ChunkCoord::new(x, 0, z),
            ChunkMesh::new()
                .with_phase(RenderPhase::Opaque, 1, triangles)
                .with_phase(RenderPhase::AlphaReject, 2, triangles / 2),
        ))
    }

    #[test]
    fn test_drain_counts_not_ready() {
        let a = meshed(0, 0, 100);
        let b = Arc::new(Chunk::new(ChunkCoord::new(1, 0, 0)));
        let c = meshed(2, 0, 40);
        let mut queue: RenderQueue = [&a, &b, &c].into_iter().map(ChunkHandle::new).collect();

        let mut seen = Vec::new();
        let stats = drain_queue(&mut queue, |chunk, mesh| {
            seen.push(chunk.coord());
            mesh.triangle_count(RenderPhase::Opaque)
        });

        assert!(queue.is_empty());
        assert_eq!(seen, vec![a.coord(), c.coord()]);
        assert_eq!(stats, PassStats { chunks_drawn: 2, triangles: 140, not_ready: 1 });
    }

    #[test]
    fn test_drain_skips_evicted_chunk() {
        let a = meshed(0, 0, 10);
        let mut queue: RenderQueue = RenderQueue::new();
        queue.push_back(ChunkHandle::new(&a));
        {
            let gone = meshed(5, 5, 10);
            queue.push_back(ChunkHandle::new(&gone));
        }

        let stats = drain_queue(&mut queue, |_, _| 10);
        assert_eq!(stats.chunks_drawn, 1);
        assert_eq!(stats.not_ready, 1);
    }

    #[test]
    fn test_render_pass_sequence_and_stats() {
        let a = meshed(0, 0, 100);
        a.set_animated(true);
        let b = meshed(1, 0, 60);
        let mut queue: RenderQueue = [&a, &b].into_iter().map(ChunkHandle::new).collect();

        let mut camera = NullCamera::new(DVec3::new(10.0, 70.0, 5.0));
        let mut backend = RecordingBackend::default();
        let mut stats = RenderStatistics::default();

        let pass = render_pass(RenderPass::AlphaReject, &mut queue, &mut camera, &mut backend, &mut stats);

        assert_eq!(
            backend.calls,
            vec![
                "begin rendering/chunksAlphaReject".to_string(),
                format!("draw {:?}", a.coord()),
                format!("draw {:?}", b.coord()),
                "end rendering/chunksAlphaReject".to_string(),
            ]
        );
        assert_eq!(pass.triangles, 50 + 30);
        assert_eq!(stats.triangles, 80);
        assert_eq!(stats.not_ready_chunks, 0);

        let (coord, phase, translation, uniforms) = backend.draws[0];
        assert_eq!(coord, a.coord());
        assert_eq!(phase, RenderPhase::AlphaReject);
        assert_eq!(translation, Vec3::new(-10.0, -70.0, -5.0));
        assert_eq!(uniforms.animated, 1.0);
        assert_eq!(backend.draws[1].3.chunk_position_world, [32.0, 0.0, 0.0]);
        assert_eq!(backend.draws[1].3.animated, 0.0);
    }

    #[test]
    fn test_camera_relative_precision() {
        let origin = DVec3::new(1.0e8, 0.0, -1.0e8);
        let camera = DVec3::new(1.0e8 - 0.25, 1.5, -1.0e8 + 0.75);
        assert_eq!(camera_relative(origin, camera), Vec3::new(0.25, -1.5, -0.75));
    }

    #[test]
    fn test_pass_descriptors() {
        assert!(RenderPass::AlphaReject.descriptor().features.contains(ShaderFeatures::ALPHA_REJECT));
        assert!(!RenderPass::Opaque.descriptor().features.contains(ShaderFeatures::ALPHA_REJECT));
        let blend = RenderPass::AlphaBlend.descriptor();
        assert_eq!(blend.order, Direction::BackToFront);
        assert!(!blend.depth_write);
        assert_eq!((ShaderFeatures::ALPHA_REJECT | ShaderFeatures::BLEND).bits(), 0b11);
    }
}
