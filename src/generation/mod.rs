//! World generation facets: sparse per-column data over a bordered region,
//! and a noise surface that fills it

pub mod facet;
pub mod surface;

pub use facet::{SparseColumnFacet, WorldFacet3D};
pub use surface::{SurfaceGenerator, SurfaceParams};
