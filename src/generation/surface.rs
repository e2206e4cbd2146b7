//! Noise-based surface marking.
//!
//! Samples a fractal heightmap and marks the surface block of every column
//! of a [`SparseColumnFacet`], the way a generation pass produces the facet
//! later passes and the mesher consume.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::core::types::{IVec3, Result};
use crate::generation::facet::{SparseColumnFacet, WorldFacet3D};
use crate::math::{Border3D, Region3i};
use crate::world::chunk::{ChunkCoord, CHUNK_SIZE};

/// Parameters controlling the surface heightmap
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceParams {
    pub seed: u32,
    pub scale: f64,        // Horizontal scale (larger = smoother)
    pub height_scale: f64, // Height of the tallest hills above base
    pub base_height: i32,  // Lowest possible surface
    pub octaves: usize,
    pub persistence: f64,
    pub lacunarity: f64,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 180.0,
            height_scale: 48.0,
            base_height: 32,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Marks surface heights in column facets
pub struct SurfaceGenerator {
    params: SurfaceParams,
    noise: Fbm<Perlin>,
}

impl SurfaceGenerator {
    pub fn new(params: SurfaceParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves)
            .set_persistence(params.persistence)
            .set_lacunarity(params.lacunarity);
        Self { params, noise }
    }

    pub fn params(&self) -> &SurfaceParams {
        &self.params
    }

    /// Surface height of the column at world (x, z)
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let n = self
            .noise
            .get([x as f64 / self.params.scale, z as f64 / self.params.scale]);
        // fBm output is roughly [-1, 1]
        let normalized = ((n + 1.0) * 0.5).clamp(0.0, 1.0);
        self.params.base_height + (normalized * self.params.height_scale).round() as i32
    }

    /// Mark the surface block of every column whose surface falls inside
    /// the facet's world region. Returns the number of marked columns.
    pub fn fill_facet(&self, facet: &mut SparseColumnFacet) -> Result<usize> {
        let region = facet.world_region();
        let mut marked = 0;
        for z in region.min.z..=region.max.z {
            for x in region.min.x..=region.max.x {
                let h = self.height_at(x, z);
                if (region.min.y..=region.max.y).contains(&h) {
                    facet.set_world(x, h, z, true)?;
                    marked += 1;
                }
            }
        }
        Ok(marked)
    }

    /// Surface facet covering one chunk plus a border
    pub fn chunk_facet(&self, coord: ChunkCoord, border: Border3D) -> Result<SparseColumnFacet> {
        let target = Region3i::from_min_and_size(coord.as_ivec3() * CHUNK_SIZE, CHUNK_SIZE);
        let mut facet = SparseColumnFacet::new(target, border);
        self.fill_facet(&mut facet)?;
        Ok(facet)
    }

    /// Number of surface blocks inside a chunk (no border)
    pub fn surface_blocks_in_chunk(&self, coord: ChunkCoord) -> Result<usize> {
        Ok(self.chunk_facet(coord, Border3D::default())?.marked_count())
    }

    /// Chunk-space y range that can contain the surface
    pub fn surface_chunk_range(&self) -> (i32, i32) {
        let low = self.params.base_height.div_euclid(CHUNK_SIZE.y);
        let high = (self.params.base_height + self.params.height_scale.ceil() as i32)
            .div_euclid(CHUNK_SIZE.y);
        (low, high)
    }
}

/// Position of the first surface block in a column, if any
pub fn column_surface(facet: &SparseColumnFacet, x: i32, z: i32) -> Result<Option<IVec3>> {
    Ok(facet
        .world_column(x, z)?
        .iter()
        .next_back()
        .map(|&y| IVec3::new(x, y, z)))
}
