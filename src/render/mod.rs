//! Chunk rendering: ordering, per-pass queues, queue draining and the
//! world renderer facade

pub mod ordering;
pub mod queues;
pub mod drain;
pub mod stats;
pub mod uniforms;
pub mod capabilities;
pub mod world_renderer;

pub use ordering::{ChunkOrderingPolicy, Direction};
pub use queues::RenderQueues;
pub use drain::{ChunkDrawBackend, ChunkDraw, PassDescriptor, RenderPass, RenderQueue};
pub use stats::{PassStats, RenderStatistics, StatisticsSink};
pub use world_renderer::{create_world_renderer, ChunkWorldRenderer, HeadlessWorldRenderer, WorldRenderer};
