//! Column-sparse boolean facet for world generation.
//!
//! Stores, for every (x, z) column of a bordered region, the set of marked
//! y values. Suited to sparse vertical data such as surface heights or cave
//! entrances, not to dense volumes.

use std::collections::BTreeSet;

use crate::core::error::Error;
use crate::core::types::{IVec3, Result};
use crate::math::{Border3D, Region3i};

/// A per-region data layer produced by a generation pass
pub trait WorldFacet3D {
    /// Covered region in world coordinates, border included
    fn world_region(&self) -> Region3i;

    /// Covered region relative to the target region's min corner, border
    /// included (so its min corner is negative when there is a border)
    fn relative_region(&self) -> Region3i;
}

/// Boolean facet optimised for asking which positions of a vertical column
/// are marked.
///
/// Columns always store world y. The relative accessors translate y by
/// `world_region.min.y - relative_region.min.y` on both reads and writes,
/// and index columns against the relative region, so a position written
/// through one accessor family is visible through the other.
#[derive(Clone, Debug)]
pub struct SparseColumnFacet {
    world_region: Region3i,
    relative_region: Region3i,
    columns: Vec<BTreeSet<i32>>,
}

impl SparseColumnFacet {
    pub fn new(target_region: Region3i, border: Border3D) -> Self {
        let world_region = border.expand_to_3d(&target_region);
        let relative_region = border.expand_size_to_3d(target_region.size());
        let column_count = (world_region.size_x() * world_region.size_z()) as usize;
        Self {
            world_region,
            relative_region,
            columns: vec![BTreeSet::new(); column_count],
        }
    }

    /// Whether the position (relative coordinates) is marked
    pub fn get(&self, x: i32, y: i32, z: i32) -> Result<bool> {
        let pos = IVec3::new(x, y, z);
        let index = Self::column_index(&self.relative_region, pos)?;
        Ok(self.columns[index].contains(&self.relative_to_world_y(y)))
    }

    /// Mark or clear a position (relative coordinates)
    pub fn set(&mut self, x: i32, y: i32, z: i32, value: bool) -> Result<()> {
        let pos = IVec3::new(x, y, z);
        let index = Self::column_index(&self.relative_region, pos)?;
        let world_y = self.relative_to_world_y(y);
        Self::apply(&mut self.columns[index], world_y, value);
        Ok(())
    }

    /// Whether the position (world coordinates) is marked
    pub fn get_world(&self, x: i32, y: i32, z: i32) -> Result<bool> {
        let index = Self::column_index(&self.world_region, IVec3::new(x, y, z))?;
        Ok(self.columns[index].contains(&y))
    }

    /// Mark or clear a position (world coordinates)
    pub fn set_world(&mut self, x: i32, y: i32, z: i32, value: bool) -> Result<()> {
        let index = Self::column_index(&self.world_region, IVec3::new(x, y, z))?;
        Self::apply(&mut self.columns[index], y, value);
        Ok(())
    }

    /// Marked world y values of a column, lowest first
    pub fn world_column(&self, x: i32, z: i32) -> Result<&BTreeSet<i32>> {
        let pos = IVec3::new(x, self.world_region.min.y, z);
        let index = Self::column_index(&self.world_region, pos)?;
        Ok(&self.columns[index])
    }

    /// Mutable column for bulk writes. Values outside the region's y range
    /// are the caller's responsibility.
    pub fn world_column_mut(&mut self, x: i32, z: i32) -> Result<&mut BTreeSet<i32>> {
        let pos = IVec3::new(x, self.world_region.min.y, z);
        let index = Self::column_index(&self.world_region, pos)?;
        Ok(&mut self.columns[index])
    }

    /// Total number of marked positions
    pub fn marked_count(&self) -> usize {
        self.columns.iter().map(BTreeSet::len).sum()
    }

    fn relative_to_world_y(&self, y: i32) -> i32 {
        y + self.world_region.min.y - self.relative_region.min.y
    }

    fn apply(column: &mut BTreeSet<i32>, y: i32, value: bool) {
        if value {
            column.insert(y);
        } else {
            column.remove(&y);
        }
    }

    fn column_index(region: &Region3i, pos: IVec3) -> Result<usize> {
        if !region.encompasses(pos) {
            return Err(Error::OutOfBounds { pos, region: *region });
        }
        Ok((pos.x - region.min.x + region.size_x() * (pos.z - region.min.z)) as usize)
    }
}

impl WorldFacet3D for SparseColumnFacet {
    fn world_region(&self) -> Region3i {
        self.world_region
    }

    fn relative_region(&self) -> Region3i {
        self.relative_region
    }
}
