use glam::{uvec4, vec2, UVec4, Vec3};
use raycore_kernels::{GeometryView, Vertex};

/// The shared template mesh: a vertex pool and one index triple per
/// triangle. Every instance in a scene references this same geometry.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    vertices: Vec<Vertex>,
    indices: Vec<UVec4>,
}

impl Geometry {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<UVec4>) -> Self {
        Self { vertices, indices }
    }

    /// The canonical axis-aligned cube spanning `[-0.5, 0.5]^3`: four
    /// vertices and two triangles per face, 24 vertices and 12 triangles
    /// total.
    pub fn unit_cube() -> Self {
        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut vertices = Vec::with_capacity(faces.len() * 4);
        let mut indices = Vec::with_capacity(faces.len() * 2);

        for (normal, tangent, bitangent) in faces {
            let base = vertices.len() as u32;

            for (du, dv) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                let position = normal * 0.5
                    + tangent * (du - 0.5)
                    + bitangent * (dv - 0.5);

                vertices.push(Vertex::new(
                    position,
                    tangent,
                    normal,
                    vec2(du, 1.0 - dv),
                ));
            }

            indices.push(uvec4(base, base + 1, base + 2, 0));
            indices.push(uvec4(base, base + 2, base + 3, 0));
        }

        Self { vertices, indices }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[UVec4] {
        &self.indices
    }

    pub fn triangle_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn view(&self) -> GeometryView<'_> {
        GeometryView::new(&self.vertices, &self.indices)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4Swizzles;
    use raycore_kernels::TriangleId;

    use super::*;

    #[test]
    fn unit_cube_shape() {
        let cube = Geometry::unit_cube();

        assert_eq!(cube.vertices().len(), 24);
        assert_eq!(cube.triangle_count(), 12);

        for vertex in cube.vertices() {
            assert_eq!(vertex.position.xyz().abs().max_element(), 0.5);
        }
    }

    #[test]
    fn unit_cube_winding_matches_normals() {
        let cube = Geometry::unit_cube();
        let view = cube.view();

        for id in 0..cube.triangle_count() {
            let triangle = view.triangle(TriangleId::new(id));

            let face_normal = (triangle.v1 - triangle.v0)
                .cross(triangle.v2 - triangle.v0);

            // Each face's geometric normal points away from the center.
            assert!(face_normal.dot(triangle.center()) > 0.0);
        }
    }
}
