use glam::{UVec4, Vec4Swizzles};

use crate::{Triangle, TriangleId, Vertex};

/// Read-only view of the shared template mesh: a vertex pool plus one index
/// triple per triangle (`.w` of each triple is padding).
#[derive(Clone, Copy)]
pub struct GeometryView<'a> {
    vertices: &'a [Vertex],
    indices: &'a [UVec4],
}

impl<'a> GeometryView<'a> {
    pub fn new(vertices: &'a [Vertex], indices: &'a [UVec4]) -> Self {
        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn vertex(&self, idx: u32) -> Vertex {
        self.vertices[idx as usize]
    }

    pub fn triangle(&self, id: TriangleId) -> Triangle {
        let ids = self.indices[id.get() as usize];

        Triangle::new(
            self.vertex(ids.x).position.xyz(),
            self.vertex(ids.y).position.xyz(),
            self.vertex(ids.z).position.xyz(),
        )
    }
}
