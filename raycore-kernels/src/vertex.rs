use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};

/// One vertex of the shared template mesh.
///
/// Everything is kept as `Vec4` so the struct can be memcpy'd into a GPU-style
/// flat buffer as-is; `position.w` is 1, `uv` lives in `.xy`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec4,
    pub tangent: Vec4,
    pub normal: Vec4,
    pub uv: Vec4,
}

impl Vertex {
    pub fn new(position: Vec3, tangent: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.extend(1.0),
            tangent: tangent.extend(0.0),
            normal: normal.extend(0.0),
            uv: uv.extend(0.0).extend(0.0),
        }
    }
}
