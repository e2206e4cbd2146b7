//! Chunks as the renderer sees them, the providers that own them, and the
//! set of chunks in proximity of the viewpoint

pub mod chunk;
pub mod provider;
pub mod store;
pub mod proximity;

pub use chunk::{Chunk, ChunkCoord, ChunkMesh, RenderPhase, CHUNK_SIZE};
pub use provider::{ChunkProvider, WorldProvider, MAX_LIGHT};
pub use store::{ChunkEvent, ChunkStore, MemoryWorld};
pub use proximity::{ChunkHandle, ChunkVisibilitySet, ProximitySnapshot};
