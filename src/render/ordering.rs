//! Distance ordering of chunks relative to the camera

use std::cmp::Ordering;

use crate::core::types::DVec3;
use crate::world::chunk::{ChunkCoord, CHUNK_SIZE};

/// Traversal direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Nearest first: opaque passes, early-out traversal
    #[default]
    FrontToBack,
    /// Farthest first: alpha blending
    BackToFront,
}

/// Orders chunks by horizontal (X/Z) distance from the camera to the chunk
/// center. Height is ignored: worlds are far wider than they are tall, so
/// vertical distance says little about occlusion at chunk granularity.
#[derive(Clone, Copy, Debug)]
pub struct ChunkOrderingPolicy {
    camera_position: DVec3,
    direction: Direction,
}

impl ChunkOrderingPolicy {
    pub fn new(camera_position: DVec3, direction: Direction) -> Self {
        Self {
            camera_position,
            direction,
        }
    }

    pub fn front_to_back(camera_position: DVec3) -> Self {
        Self::new(camera_position, Direction::FrontToBack)
    }

    pub fn back_to_front(camera_position: DVec3) -> Self {
        Self::new(camera_position, Direction::BackToFront)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Squared horizontal distance from the camera to the chunk center
    pub fn distance_squared(&self, coord: ChunkCoord) -> f64 {
        let dx = (coord.x as f64 + 0.5) * CHUNK_SIZE.x as f64 - self.camera_position.x;
        let dz = (coord.z as f64 + 0.5) * CHUNK_SIZE.z as f64 - self.camera_position.z;
        dx * dx + dz * dz
    }

    /// Total order on coordinates; equal distances compare equal
    pub fn compare(&self, a: ChunkCoord, b: ChunkCoord) -> Ordering {
        let ordering = self.distance_squared(a).total_cmp(&self.distance_squared(b));
        match self.direction {
            Direction::FrontToBack => ordering,
            Direction::BackToFront => ordering.reverse(),
        }
    }

    /// Stable sort of arbitrary items keyed by their chunk coordinate
    pub fn sort_by_coord<T>(&self, items: &mut [T], coord: impl Fn(&T) -> ChunkCoord) {
        items.sort_by_cached_key(|item| {
            let d = self.distance_squared(coord(item));
            match self.direction {
                Direction::FrontToBack => OrderedDistance(d),
                Direction::BackToFront => OrderedDistance(-d),
            }
        });
    }

    /// Stable sort of chunk coordinates
    pub fn sort(&self, coords: &mut [ChunkCoord]) {
        self.sort_by_coord(coords, |c| *c);
    }
}

/// `f64` sort key with a total order
#[derive(Clone, Copy, Debug, PartialEq)]
struct OrderedDistance(f64);

impl Eq for OrderedDistance {}

impl PartialOrd for OrderedDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedDistance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
