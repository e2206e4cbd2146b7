//! Error types for the world-rendering core

use thiserror::Error;

use crate::core::types::IVec3;
use crate::math::Region3i;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    /// A facet was addressed outside the region it covers. Always a bug in the
    /// caller's border computation.
    #[error("Out of bounds: {pos} for region {region}")]
    OutOfBounds { pos: IVec3, region: Region3i },

    #[error("{0}")]
    MissingCapabilities(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
