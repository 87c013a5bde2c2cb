use bytemuck::{Pod, Zeroable};
use glam::{vec4, Vec3, Vec4};

/// Six view-frustum planes, each stored as `(normal, d)` with the normal
/// pointing into the frustum; a point `p` lies inside a plane iff
/// `dot(vec4(p, 1), plane) >= 0`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Frustum {
    pub fn new(planes: [Vec4; 6]) -> Self {
        Self { planes }
    }

    /// Builds the planes from the camera's position, basis vectors and
    /// projection parameters (`fov_y` is the full vertical field of view).
    pub fn from_view(
        pos: Vec3,
        dir: Vec3,
        up: Vec3,
        right: Vec3,
        t_near: f32,
        t_far: f32,
        fov_y: f32,
        aspect: f32,
    ) -> Self {
        // Frustum half-extents at unit distance along `dir`.
        let half_y = (fov_y / 2.0).tan();
        let half_x = half_y * aspect;

        Self::new([
            plane(dir, pos + dir * t_near),
            plane(-dir, pos + dir * t_far),
            plane((dir - right * half_x).cross(up), pos),
            plane(up.cross(dir + right * half_x), pos),
            plane(right.cross(dir - up * half_y), pos),
            plane((dir + up * half_y).cross(right), pos),
        ])
    }

    /// Positive-vertex test: per plane, only the box corner furthest along
    /// the plane normal can decide containment, so a box intersecting or
    /// inside the frustum passes all six tests.
    pub fn contains_box(&self, bounds_min: Vec3, bounds_max: Vec3) -> bool {
        for plane in self.planes {
            let p = vec4(
                if plane.x < 0.0 { bounds_min.x } else { bounds_max.x },
                if plane.y < 0.0 { bounds_min.y } else { bounds_max.y },
                if plane.z < 0.0 { bounds_min.z } else { bounds_max.z },
                1.0,
            );

            if p.dot(plane) < 0.0 {
                return false;
            }
        }

        true
    }
}

fn plane(normal: Vec3, point: Vec3) -> Vec4 {
    let normal = normal.normalize();

    normal.extend(-normal.dot(point))
}
