//! Strata - world-rendering core for a chunked voxel engine

pub mod core;
pub mod math;
pub mod world;
pub mod render;
pub mod generation;
