//! Mathematical utilities and data structures

pub mod region;
pub mod frustum;

pub use region::{Border3D, Region3i};
pub use frustum::{Plane, Frustum};
