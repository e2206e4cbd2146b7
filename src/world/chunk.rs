//! Chunks as seen by the renderer: a grid coordinate, an optional mesh and
//! a few render flags.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::core::config::ChunkRounding;
use crate::core::types::{DVec3, IVec3};

/// Size of a chunk in blocks along each axis
pub const CHUNK_SIZE: IVec3 = IVec3::new(32, 64, 32);

/// Largest chunk coordinate magnitude a viewpoint maps to. Leaves headroom
/// for view regions and block-space math around it.
pub const MAX_CHUNK_COORD: i32 = 1 << 24;

/// Integer coordinate identifying a chunk in the world grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    /// Create a new chunk coordinate
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chunk containing a world position, clamped to `±MAX_CHUNK_COORD`
    pub fn from_world_pos(pos: DVec3, rounding: ChunkRounding) -> Self {
        let size = CHUNK_SIZE.as_dvec3();
        let scaled = match rounding {
            ChunkRounding::Floor => (pos / size).floor(),
            ChunkRounding::Truncate => (pos / size).trunc(),
        };
        let limit = MAX_CHUNK_COORD as f64;
        // NaN maps to 0 through the `as` cast
        let c = scaled.clamp(DVec3::splat(-limit), DVec3::splat(limit));
        Self::new(c.x as i32, c.y as i32, c.z as i32)
    }

    /// World-space origin (minimum corner) of this chunk
    pub fn world_origin(&self) -> DVec3 {
        self.as_ivec3().as_dvec3() * CHUNK_SIZE.as_dvec3()
    }

    /// World-space center of this chunk
    pub fn world_center(&self) -> DVec3 {
        self.world_origin() + CHUNK_SIZE.as_dvec3() * 0.5
    }

    pub fn as_ivec3(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

impl From<IVec3> for ChunkCoord {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<ChunkCoord> for IVec3 {
    fn from(c: ChunkCoord) -> Self {
        c.as_ivec3()
    }
}

/// Geometry phase of a chunk mesh. Each render pass draws one phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderPhase {
    Opaque,
    AlphaReject,
    AlphaBlend,
}

impl RenderPhase {
    pub const ALL: [RenderPhase; 3] = [
        RenderPhase::Opaque,
        RenderPhase::AlphaReject,
        RenderPhase::AlphaBlend,
    ];

    fn index(self) -> usize {
        match self {
            RenderPhase::Opaque => 0,
            RenderPhase::AlphaReject => 1,
            RenderPhase::AlphaBlend => 2,
        }
    }
}

/// GPU-side geometry for one phase: an opaque buffer handle owned by the
/// graphics layer and the number of triangles it holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshBuffer {
    pub buffer_id: u64,
    pub triangle_count: u32,
}

/// Uploaded mesh of a chunk, split by render phase
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkMesh {
    phases: [Option<MeshBuffer>; 3],
}

impl ChunkMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper attaching geometry for one phase
    pub fn with_phase(mut self, phase: RenderPhase, buffer_id: u64, triangle_count: u32) -> Self {
        self.phases[phase.index()] = Some(MeshBuffer {
            buffer_id,
            triangle_count,
        });
        self
    }

    pub fn buffer(&self, phase: RenderPhase) -> Option<MeshBuffer> {
        self.phases[phase.index()]
    }

    /// Whether this mesh has anything to draw in the given phase
    pub fn has_phase(&self, phase: RenderPhase) -> bool {
        self.buffer(phase).is_some_and(|b| b.triangle_count > 0)
    }

    pub fn triangle_count(&self, phase: RenderPhase) -> u32 {
        self.buffer(phase).map_or(0, |b| b.triangle_count)
    }

    pub fn total_triangle_count(&self) -> u32 {
        RenderPhase::ALL.iter().map(|p| self.triangle_count(*p)).sum()
    }
}

/// A chunk owned by a [`ChunkProvider`](crate::world::ChunkProvider).
///
/// The mesh slot is shared with the meshing producer, so it sits behind a
/// lock; readers clone the `Arc<ChunkMesh>` and never hold the lock while
/// drawing.
#[derive(Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    mesh: RwLock<Option<Arc<ChunkMesh>>>,
    animated: AtomicBool,
    mesh_disposals: AtomicU32,
}

impl Chunk {
    /// Create a chunk that has not been meshed yet
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            mesh: RwLock::new(None),
            animated: AtomicBool::new(false),
            mesh_disposals: AtomicU32::new(0),
        }
    }

    /// Create a chunk with an uploaded mesh
    pub fn with_mesh(coord: ChunkCoord, mesh: ChunkMesh) -> Self {
        let chunk = Self::new(coord);
        chunk.set_mesh(mesh);
        chunk
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn world_origin(&self) -> DVec3 {
        self.coord.world_origin()
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Current mesh, if the chunk has been meshed and not disposed since
    pub fn mesh(&self) -> Option<Arc<ChunkMesh>> {
        self.mesh
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a freshly built mesh, replacing any previous one
    pub fn set_mesh(&self, mesh: ChunkMesh) {
        *self.mesh.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(mesh));
    }

    /// Release the mesh. Returns whether there was one to release.
    pub fn dispose_mesh(&self) -> bool {
        let released = self
            .mesh
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if released {
            self.mesh_disposals.fetch_add(1, Ordering::Relaxed);
        }
        released
    }

    /// How many meshes this chunk has released over its lifetime
    pub fn mesh_disposals(&self) -> u32 {
        self.mesh_disposals.load(Ordering::Relaxed)
    }

    pub fn is_animated(&self) -> bool {
        self.animated.load(Ordering::Relaxed)
    }

    pub fn set_animated(&self, animated: bool) {
        self.animated.store(animated, Ordering::Relaxed);
    }
}
