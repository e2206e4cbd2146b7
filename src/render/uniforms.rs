//! Per-chunk shader uniforms

use bytemuck::{Pod, Zeroable};

use crate::core::types::DVec3;

/// Chunk uniform data for the chunk shader (must match the shader struct).
/// vec3 has 16-byte alignment, so the animated flag fills the padding slot.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ChunkUniforms {
    /// World-space chunk origin (12 bytes, offset 0)
    pub chunk_position_world: [f32; 3],
    /// 1.0 for animated chunks (waving foliage, liquids), else 0.0 (offset 12)
    pub animated: f32,
}

impl ChunkUniforms {
    pub fn new(origin: DVec3, animated: bool) -> Self {
        Self {
            chunk_position_world: origin.as_vec3().to_array(),
            animated: if animated { 1.0 } else { 0.0 },
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(std::mem::size_of::<ChunkUniforms>(), 16);
        let u = ChunkUniforms::new(DVec3::new(32.0, -64.0, 96.0), true);
        assert_eq!(u.as_bytes().len(), 16);
        assert_eq!(u.chunk_position_world, [32.0, -64.0, 96.0]);
        assert_eq!(u.animated, 1.0);
    }
}
