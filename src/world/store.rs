//! In-memory providers: a bounded chunk store and a world view backed by
//! plain maps. Used by the headless demo, benches and tests, and as the
//! reference for how a real provider sequences its update cycle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::types::IVec3;
use crate::world::chunk::{Chunk, ChunkCoord};
use crate::world::provider::{ChunkProvider, WorldProvider, MAX_LIGHT};

/// Residency change published by [`ChunkStore::complete_update`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkEvent {
    Loaded(ChunkCoord),
    Unloaded(ChunkCoord),
}

/// Bounded chunk store with least-recently-committed eviction.
///
/// Producers hand finished chunks to [`stage`](Self::stage); they only become
/// resident when the renderer completes the current update cycle, so
/// residency never changes in the middle of a frame.
pub struct ChunkStore {
    /// Resident chunks
    chunks: HashMap<ChunkCoord, Arc<Chunk>>,
    /// Commit order: oldest first, newest last
    access_order: Vec<ChunkCoord>,
    /// Chunks waiting for the next `complete_update`
    staged: Vec<Chunk>,
    /// Unload requests waiting for the next `complete_update`
    unload_requests: HashSet<ChunkCoord>,
    /// Events produced by committed updates, drained by the owner
    events: Vec<ChunkEvent>,
    /// Maximum number of resident chunks
    max_chunks: usize,
    /// Whether an update cycle is open
    updating: bool,
    /// Number of completed update cycles
    cycles: u64,
}

impl ChunkStore {
    /// Create a store that keeps at most `max_chunks` resident chunks
    pub fn new(max_chunks: usize) -> Self {
        Self {
            chunks: HashMap::with_capacity(max_chunks),
            access_order: Vec::with_capacity(max_chunks),
            staged: Vec::new(),
            unload_requests: HashSet::new(),
            events: Vec::new(),
            max_chunks,
            updating: false,
            cycles: 0,
        }
    }

    /// Queue a finished chunk for the next commit
    pub fn stage(&mut self, chunk: Chunk) {
        self.staged.push(chunk);
    }

    /// Queue a chunk for removal at the next commit
    pub fn request_unload(&mut self, coord: ChunkCoord) {
        self.unload_requests.insert(coord);
    }

    /// Insert a chunk immediately, bypassing the update cycle
    pub fn insert(&mut self, chunk: Chunk) -> Arc<Chunk> {
        self.commit(chunk)
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Number of resident chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of chunks waiting for the next commit
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Number of completed update cycles
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Take the residency events produced since the last call
    pub fn drain_events(&mut self) -> Vec<ChunkEvent> {
        std::mem::take(&mut self.events)
    }

    /// Iterate resident coordinates
    pub fn coords(&self) -> impl Iterator<Item = &ChunkCoord> {
        self.chunks.keys()
    }

    fn commit(&mut self, chunk: Chunk) -> Arc<Chunk> {
        let coord = chunk.coord();
        let chunk = Arc::new(chunk);

        if let Some(replaced) = self.chunks.insert(coord, Arc::clone(&chunk)) {
            replaced.dispose_mesh();
            self.remove_from_access_order(coord);
        }
        self.access_order.push(coord);
        self.events.push(ChunkEvent::Loaded(coord));

        while self.chunks.len() > self.max_chunks {
            if self.evict_oldest().is_none() {
                break;
            }
        }
        chunk
    }

    /// Remove a chunk and release its mesh
    pub fn remove(&mut self, coord: ChunkCoord) -> Option<Arc<Chunk>> {
        self.remove_from_access_order(coord);
        let removed = self.chunks.remove(&coord)?;
        removed.dispose_mesh();
        self.events.push(ChunkEvent::Unloaded(coord));
        Some(removed)
    }

    /// Evict the least recently committed chunk
    pub fn evict_oldest(&mut self) -> Option<Arc<Chunk>> {
        let coord = self.access_order.first().copied()?;
        log::trace!("Evicting chunk {:?}", coord);
        self.remove(coord)
    }

    fn remove_from_access_order(&mut self, coord: ChunkCoord) {
        if let Some(pos) = self.access_order.iter().position(|&c| c == coord) {
            self.access_order.remove(pos);
        }
    }
}

impl ChunkProvider for ChunkStore {
    fn chunk(&self, coord: ChunkCoord) -> Option<Arc<Chunk>> {
        self.chunks.get(&coord).cloned()
    }

    fn begin_update(&mut self) {
        if self.updating {
            log::warn!("begin_update called twice without complete_update");
        }
        self.updating = true;
    }

    fn complete_update(&mut self) {
        if !self.updating {
            // The first frame completes before anything was begun.
            log::trace!("complete_update without an open cycle");
        }

        let unloads: Vec<_> = self.unload_requests.drain().collect();
        for coord in unloads {
            self.remove(coord);
        }

        let staged = std::mem::take(&mut self.staged);
        let committed = staged.len();
        for chunk in staged {
            self.commit(chunk);
        }

        if committed > 0 {
            log::debug!("Committed {} chunks, {} resident", committed, self.chunks.len());
        }

        self.updating = false;
        self.cycles += 1;
    }
}

/// World view backed by maps: which chunks have local views ready, plus
/// sparse light overrides on top of uniform defaults.
pub struct MemoryWorld {
    ready: HashSet<ChunkCoord>,
    sunlight: HashMap<IVec3, u8>,
    light: HashMap<IVec3, u8>,
    default_sunlight: u8,
    daylight: f32,
    propagation_ticks: u64,
    disposed: bool,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self {
            ready: HashSet::new(),
            sunlight: HashMap::new(),
            light: HashMap::new(),
            default_sunlight: MAX_LIGHT,
            daylight: 1.0,
            propagation_ticks: 0,
            disposed: false,
        }
    }

    /// Mark the local view around `coord` as ready
    pub fn mark_ready(&mut self, coord: ChunkCoord) {
        self.ready.insert(coord);
    }

    pub fn mark_not_ready(&mut self, coord: ChunkCoord) {
        self.ready.remove(&coord);
    }

    pub fn set_sunlight(&mut self, pos: IVec3, level: u8) {
        self.sunlight.insert(pos, level.min(MAX_LIGHT));
    }

    pub fn set_light(&mut self, pos: IVec3, level: u8) {
        self.light.insert(pos, level.min(MAX_LIGHT));
    }

    pub fn set_daylight(&mut self, daylight: f32) {
        self.daylight = daylight.clamp(0.0, 1.0);
    }

    pub fn propagation_ticks(&self) -> u64 {
        self.propagation_ticks
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldProvider for MemoryWorld {
    fn has_local_view(&self, coord: ChunkCoord) -> bool {
        !self.disposed && self.ready.contains(&coord)
    }

    fn process_propagation(&mut self) {
        self.propagation_ticks += 1;
    }

    fn sunlight(&self, pos: IVec3) -> u8 {
        self.sunlight.get(&pos).copied().unwrap_or(self.default_sunlight)
    }

    fn light(&self, pos: IVec3) -> u8 {
        self.light.get(&pos).copied().unwrap_or(0)
    }

    fn daylight(&self) -> f32 {
        self.daylight
    }

    fn dispose(&mut self) {
        if self.disposed {
            log::warn!("World provider disposed twice");
        }
        self.disposed = true;
        self.ready.clear();
    }
}
