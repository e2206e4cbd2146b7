//! Collaborators the renderer reads world state through.
//!
//! Both providers may be fed by producers running off the frame thread, so
//! nothing they return is assumed to stay valid past the call that returned
//! it.

use std::sync::{Arc, Mutex, PoisonError};

use crate::core::types::IVec3;
use crate::world::chunk::{Chunk, ChunkCoord};

/// Highest value of the sunlight and block light channels
pub const MAX_LIGHT: u8 = 15;

/// Owner of resident chunks
pub trait ChunkProvider {
    /// Resident chunk at `coord`, if any
    fn chunk(&self, coord: ChunkCoord) -> Option<Arc<Chunk>>;

    /// Open the next residency update cycle
    fn begin_update(&mut self);

    /// Finish the cycle opened by the previous `begin_update`, committing
    /// chunks that became ready and releasing evicted ones
    fn complete_update(&mut self);
}

/// Block and lighting data of the world
pub trait WorldProvider {
    /// Whether the world data around `coord` (the chunk and its neighbours)
    /// is ready to be rendered
    fn has_local_view(&self, coord: ChunkCoord) -> bool;

    /// Advance light and liquid propagation by one tick
    fn process_propagation(&mut self);

    /// Sunlight level at a block, `0..=MAX_LIGHT`
    fn sunlight(&self, pos: IVec3) -> u8;

    /// Block light level at a block, `0..=MAX_LIGHT`
    fn light(&self, pos: IVec3) -> u8;

    /// Current daylight factor, `0.0..=1.0`
    fn daylight(&self) -> f32;

    /// Release world resources
    fn dispose(&mut self);
}

// Shared providers: the frame thread reads through the lock while producers
// stage chunks and mark views ready through their own clone.

impl<P: ChunkProvider + ?Sized> ChunkProvider for Arc<Mutex<P>> {
    fn chunk(&self, coord: ChunkCoord) -> Option<Arc<Chunk>> {
        self.lock().unwrap_or_else(PoisonError::into_inner).chunk(coord)
    }

    fn begin_update(&mut self) {
        self.lock().unwrap_or_else(PoisonError::into_inner).begin_update();
    }

    fn complete_update(&mut self) {
        self.lock().unwrap_or_else(PoisonError::into_inner).complete_update();
    }
}

impl<W: WorldProvider + ?Sized> WorldProvider for Arc<Mutex<W>> {
    fn has_local_view(&self, coord: ChunkCoord) -> bool {
        self.lock().unwrap_or_else(PoisonError::into_inner).has_local_view(coord)
    }

    fn process_propagation(&mut self) {
        self.lock().unwrap_or_else(PoisonError::into_inner).process_propagation();
    }

    fn sunlight(&self, pos: IVec3) -> u8 {
        self.lock().unwrap_or_else(PoisonError::into_inner).sunlight(pos)
    }

    fn light(&self, pos: IVec3) -> u8 {
        self.lock().unwrap_or_else(PoisonError::into_inner).light(pos)
    }

    fn daylight(&self) -> f32 {
        self.lock().unwrap_or_else(PoisonError::into_inner).daylight()
    }

    fn dispose(&mut self) {
        self.lock().unwrap_or_else(PoisonError::into_inner).dispose();
    }
}
