//! Integer axis-aligned regions in block or chunk space

use std::fmt;

use crate::core::types::IVec3;

/// Axis-aligned box of integer positions. Both corners are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region3i {
    pub min: IVec3,
    pub max: IVec3,
}

impl Region3i {
    /// Region that contains nothing. Its size is zero on every axis.
    pub const EMPTY: Region3i = Region3i {
        min: IVec3::ZERO,
        max: IVec3::NEG_ONE,
    };

    /// Create region from inclusive min and max corners
    pub fn new(min: IVec3, max: IVec3) -> Self {
        Self { min, max }
    }

    /// Create region from its min corner and size
    pub fn from_min_and_size(min: IVec3, size: IVec3) -> Self {
        Self {
            min,
            max: min + size - IVec3::ONE,
        }
    }

    /// Region spanning `center - extents ..= center + extents`, saturating at
    /// the `i32` range
    pub fn from_center_extents(center: IVec3, extents: IVec3) -> Self {
        Self {
            min: center.saturating_sub(extents),
            max: center.saturating_add(extents),
        }
    }

    /// Number of positions along each axis (zero for an empty axis)
    pub fn size(&self) -> IVec3 {
        (self.max - self.min + IVec3::ONE).max(IVec3::ZERO)
    }

    pub fn size_x(&self) -> i32 {
        self.size().x
    }

    pub fn size_y(&self) -> i32 {
        self.size().y
    }

    pub fn size_z(&self) -> i32 {
        self.size().z
    }

    /// Total number of positions
    pub fn volume(&self) -> usize {
        let s = self.size();
        s.x as usize * s.y as usize * s.z as usize
    }

    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// Check if a position lies inside the region
    pub fn encompasses(&self, pos: IVec3) -> bool {
        pos.cmpge(self.min).all() && pos.cmple(self.max).all()
    }

    /// Grow (or shrink, for negative amounts) every face independently
    pub fn expand(&self, below: IVec3, above: IVec3) -> Self {
        Self {
            min: self.min - below,
            max: self.max + above,
        }
    }

    /// Iterate every position, x fastest then y then z
    pub fn iter(&self) -> RegionIter {
        RegionIter {
            region: *self,
            next: (!self.is_empty()).then_some(self.min),
        }
    }

    /// Positions inside `self` that are not inside `other`
    pub fn subtract(&self, other: &Region3i) -> impl Iterator<Item = IVec3> + '_ {
        let other = *other;
        self.iter().filter(move |p| !other.encompasses(*p))
    }
}

impl fmt::Display for Region3i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}

impl IntoIterator for Region3i {
    type Item = IVec3;
    type IntoIter = RegionIter;

    fn into_iter(self) -> RegionIter {
        self.iter()
    }
}

/// Iterator over the positions of a [`Region3i`]
#[derive(Clone, Debug)]
pub struct RegionIter {
    region: Region3i,
    next: Option<IVec3>,
}

impl Iterator for RegionIter {
    type Item = IVec3;

    fn next(&mut self) -> Option<IVec3> {
        let current = self.next?;
        let Region3i { min, max } = self.region;
        // Compare before stepping so regions touching i32::MAX terminate
        self.next = if current.x < max.x {
            Some(IVec3::new(current.x + 1, current.y, current.z))
        } else if current.y < max.y {
            Some(IVec3::new(min.x, current.y + 1, current.z))
        } else if current.z < max.z {
            Some(IVec3::new(min.x, min.y, current.z + 1))
        } else {
            None
        };
        Some(current)
    }
}

/// Border added around a region by generation passes that need to read or
/// write past the edges of their target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Border3D {
    pub top: i32,
    pub bottom: i32,
    pub sides: i32,
}

impl Border3D {
    pub fn new(top: i32, bottom: i32, sides: i32) -> Self {
        Self { top, bottom, sides }
    }

    /// Expand a region by this border
    pub fn expand_to_3d(&self, region: &Region3i) -> Region3i {
        region.expand(
            IVec3::new(self.sides, self.bottom, self.sides),
            IVec3::new(self.sides, self.top, self.sides),
        )
    }

    /// Expand the zero-based region of the given size by this border
    pub fn expand_size_to_3d(&self, size: IVec3) -> Region3i {
        self.expand_to_3d(&Region3i::from_min_and_size(IVec3::ZERO, size))
    }
}
