//! The geometry store: the immutable, indexed triangle list the pipeline renders every frame.

use easyerr::Error;
use glam::{Vec2, Vec3};

/// A mesh vertex in local space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
}

/// Errors produced while validating mesh input.
#[derive(Debug, Clone, Error)]
pub enum GeometryError {
    #[error("index count {count} is not a multiple of 3")]
    IndexCount { count: usize },
    #[error("index {index} (at position {position}) is out of range of {vertices} vertices")]
    IndexOutOfRange {
        index: u32,
        position: usize,
        vertices: usize,
    },
    #[error("got {uvs} texture coordinates for {positions} positions")]
    UvCount { positions: usize, uvs: usize },
}

/// Read-only mesh buffers: positions, texture coordinates and the index list.
#[derive(Debug, Clone, Default)]
pub struct GeometryStore {
    positions: Box<[Vec3]>,
    uvs: Box<[Vec2]>,
    indices: Box<[u32]>,
}

impl GeometryStore {
    /// Validates and stores a mesh. Nothing is stored if validation fails.
    pub fn load(positions: &[Vec3], uvs: &[Vec2], indices: &[u32]) -> Result<Self, GeometryError> {
        if indices.len() % 3 != 0 {
            return Err(GeometryError::IndexCount {
                count: indices.len(),
            });
        }

        if uvs.len() != positions.len() {
            return Err(GeometryError::UvCount {
                positions: positions.len(),
                uvs: uvs.len(),
            });
        }

        if let Some((position, &index)) = indices
            .iter()
            .enumerate()
            .find(|(_, index)| **index as usize >= positions.len())
        {
            return Err(GeometryError::IndexOutOfRange {
                index,
                position,
                vertices: positions.len(),
            });
        }

        Ok(Self {
            positions: positions.into(),
            uvs: uvs.into(),
            indices: indices.into(),
        })
    }

    #[inline(always)]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline(always)]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline(always)]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline(always)]
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    #[inline(always)]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the vertices of the triangle with the given index.
    ///
    /// # Panics
    /// Panics if `triangle` is not smaller than [`Self::triangle_count`].
    #[inline(always)]
    pub fn triangle(&self, triangle: usize) -> [Vertex; 3] {
        let base = triangle * 3;
        std::array::from_fn(|i| {
            let index = self.indices[base + i] as usize;
            Vertex {
                position: self.positions[index],
                uv: self.uvs[index],
            }
        })
    }

    /// Size of the stored buffers, in bytes.
    pub fn size_in_bytes(&self) -> usize {
        size_of_val(&*self.positions) + size_of_val(&*self.uvs) + size_of_val(&*self.indices)
    }
}
