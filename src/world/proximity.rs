//! Tracks the chunks in proximity of the viewpoint.
//!
//! Membership is recomputed only when the viewpoint crosses a chunk
//! boundary, when forced, or while chunks inside the view region are still
//! missing. Once every chunk around the viewpoint is ready, standing still
//! costs nothing; moving touches the shell that left the region plus a
//! residency check of the new region.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use crate::core::config::{ChunkRounding, RenderConfig};
use crate::core::types::{DVec3, IVec3};
use crate::math::Region3i;
use crate::render::ordering::ChunkOrderingPolicy;
use crate::world::chunk::{Chunk, ChunkCoord};
use crate::world::provider::{ChunkProvider, WorldProvider};

/// Non-owning reference to a chunk in proximity.
///
/// The provider may evict the chunk at any time; [`upgrade`](Self::upgrade)
/// is the liveness check every consumer goes through.
#[derive(Clone, Debug)]
pub struct ChunkHandle {
    coord: ChunkCoord,
    chunk: Weak<Chunk>,
}

impl ChunkHandle {
    pub fn new(chunk: &Arc<Chunk>) -> Self {
        Self {
            coord: chunk.coord(),
            chunk: Arc::downgrade(chunk),
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// The chunk, if its owner still holds it
    pub fn upgrade(&self) -> Option<Arc<Chunk>> {
        self.chunk.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.chunk.strong_count() > 0
    }
}

/// Ordered, immutable view of the proximity set as of one update.
///
/// Render passes read a snapshot while the next update builds a new one, so
/// the two never alias.
#[derive(Clone, Debug)]
pub struct ProximitySnapshot {
    chunks: Arc<[ChunkHandle]>,
    viewpoint: DVec3,
}

impl ProximitySnapshot {
    pub fn new(chunks: Vec<ChunkHandle>, viewpoint: DVec3) -> Self {
        Self {
            chunks: chunks.into(),
            viewpoint,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Handles in front-to-back order from the viewpoint of the update
    pub fn iter(&self) -> impl Iterator<Item = &ChunkHandle> {
        self.chunks.iter()
    }

    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.iter().map(|h| h.coord)
    }

    /// Viewpoint the snapshot was sorted against
    pub fn viewpoint(&self) -> DVec3 {
        self.viewpoint
    }
}

impl Default for ProximitySnapshot {
    fn default() -> Self {
        Self::new(Vec::new(), DVec3::ZERO)
    }
}

/// The set of chunks currently in proximity of the viewpoint
pub struct ChunkVisibilitySet {
    /// Members keyed by coordinate; never holds duplicates
    members: BTreeMap<ChunkCoord, Weak<Chunk>>,
    /// Viewpoint chunk of the last applied update
    last_viewpoint_chunk: Option<ChunkCoord>,
    /// Sticky: some chunk in the view region was not ready last time
    pending: bool,
    /// Chunks spanned by the view region along each axis
    view_distance: IVec3,
    rounding: ChunkRounding,
    snapshot: ProximitySnapshot,
}

impl ChunkVisibilitySet {
    pub fn new(view_distance: IVec3, rounding: ChunkRounding) -> Self {
        Self {
            members: BTreeMap::new(),
            last_viewpoint_chunk: None,
            pending: false,
            view_distance,
            rounding,
            snapshot: ProximitySnapshot::default(),
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.view_distance.chunk_distance(), config.chunk_rounding)
    }

    /// Updates the set of chunks around the viewpoint.
    ///
    /// Returns true if the set was recomputed.
    pub fn update_chunks_in_proximity(
        &mut self,
        force: bool,
        viewpoint: DVec3,
        chunks: &dyn ChunkProvider,
        world: &dyn WorldProvider,
    ) -> bool {
        let new_chunk = ChunkCoord::from_world_pos(viewpoint, self.rounding);

        let moved = self.last_viewpoint_chunk != Some(new_chunk);
        if !moved && !force && !self.pending {
            return false;
        }

        let view_region = self.region_around(new_chunk);
        let mut missing = 0usize;

        match self.last_viewpoint_chunk {
            Some(last) if !self.members.is_empty() && !force && !self.pending => {
                let old_region = self.region_around(last);

                let mut disposed = 0usize;
                for pos in old_region.subtract(&view_region) {
                    let coord = ChunkCoord::from(pos);
                    self.members.remove(&coord);
                    if let Some(chunk) = chunks.chunk(coord) {
                        if chunk.dispose_mesh() {
                            disposed += 1;
                        }
                    }
                }

                for pos in view_region {
                    let coord = ChunkCoord::from(pos);
                    match Self::resolve(coord, chunks, world) {
                        Some(chunk) => {
                            self.members.insert(coord, Arc::downgrade(&chunk));
                        }
                        None => {
                            self.members.remove(&coord);
                            missing += 1;
                        }
                    }
                }

                log::trace!(
                    "Proximity moved {:?} -> {:?}: {} in set, {} meshes disposed, {} missing",
                    last,
                    new_chunk,
                    self.members.len(),
                    disposed,
                    missing
                );
            }
            _ => {
                self.members.clear();
                for pos in view_region {
                    let coord = ChunkCoord::from(pos);
                    match Self::resolve(coord, chunks, world) {
                        Some(chunk) => {
                            self.members.insert(coord, Arc::downgrade(&chunk));
                        }
                        None => missing += 1,
                    }
                }

                log::debug!(
                    "Proximity rebuilt around {:?}: {} of {} chunks ready",
                    new_chunk,
                    self.members.len(),
                    view_region.volume()
                );
            }
        }

        self.last_viewpoint_chunk = Some(new_chunk);
        self.pending = missing > 0;
        self.publish(viewpoint);

        true
    }

    /// A chunk was committed by its provider. If it falls inside the current
    /// view region the next update retries the region.
    pub fn notify_chunk_loaded(&mut self, coord: ChunkCoord) {
        if self.view_region().encompasses(coord.as_ivec3()) {
            self.pending = true;
        }
    }

    /// A chunk was evicted by its provider. The handle is dropped without
    /// touching the mesh; the owner already released it.
    pub fn notify_chunk_unloaded(&mut self, coord: ChunkCoord) {
        if self.members.remove(&coord).is_some() {
            let kept: Vec<_> = self
                .snapshot
                .iter()
                .filter(|h| h.coord != coord)
                .cloned()
                .collect();
            self.snapshot = ProximitySnapshot::new(kept, self.snapshot.viewpoint);
            if self.view_region().encompasses(coord.as_ivec3()) {
                self.pending = true;
            }
        }
    }

    /// Change the size of the view region. The next update rebuilds.
    pub fn set_view_distance(&mut self, view_distance: IVec3) {
        if self.view_distance != view_distance {
            log::info!("View distance changed {} -> {}", self.view_distance, view_distance);
            self.view_distance = view_distance;
            self.pending = true;
        }
    }

    pub fn view_distance(&self) -> IVec3 {
        self.view_distance
    }

    /// Ordered snapshot produced by the latest update
    pub fn snapshot(&self) -> ProximitySnapshot {
        self.snapshot.clone()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.members.contains_key(&coord)
    }

    /// Whether some chunk in the view region was not ready at the last update
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn viewpoint_chunk(&self) -> Option<ChunkCoord> {
        self.last_viewpoint_chunk
    }

    /// Current view region, empty before the first update
    pub fn view_region(&self) -> Region3i {
        self.last_viewpoint_chunk
            .map_or(Region3i::EMPTY, |c| self.region_around(c))
    }

    fn region_around(&self, center: ChunkCoord) -> Region3i {
        Region3i::from_center_extents(center.as_ivec3(), self.view_distance / 2)
    }

    /// A chunk counts only when it is resident and its world data is ready
    fn resolve(
        coord: ChunkCoord,
        chunks: &dyn ChunkProvider,
        world: &dyn WorldProvider,
    ) -> Option<Arc<Chunk>> {
        chunks
            .chunk(coord)
            .filter(|chunk| world.has_local_view(chunk.coord()))
    }

    fn publish(&mut self, viewpoint: DVec3) {
        let mut ordered: Vec<ChunkHandle> = self
            .members
            .iter()
            .map(|(coord, chunk)| ChunkHandle {
                coord: *coord,
                chunk: chunk.clone(),
            })
            .collect();
        ChunkOrderingPolicy::front_to_back(viewpoint).sort_by_coord(&mut ordered, |h| h.coord);
        self.snapshot = ProximitySnapshot::new(ordered, viewpoint);
    }
}
