use glam::Vec3;

use crate::{Ray, INTERSECT_EPSILON};

/// Three triangle corners, assembled from the vertex pool by a
/// [`GeometryView`](crate::GeometryView).
///
/// Whether the corners are world-space or instance-local depends on the ray
/// they get tested against; the math is frame-agnostic.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    pub fn positions(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    pub fn center(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Möller-Trumbore intersection.
    ///
    /// Returns the parametric distance plus barycentric coordinates, or
    /// `None` when the ray is (near-)parallel to the triangle's plane or the
    /// barycentric coordinates fall outside it. `t` is *not* clipped here
    /// (it can even be negative); callers clip against their own ray
    /// segment.
    pub fn intersect(&self, ray: Ray) -> Option<TriangleHit> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;

        let h = ray.direction().cross(e2);
        let a = e1.dot(h);

        if a.abs() < INTERSECT_EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = s.dot(h) * f;

        if u < 0.0 || u > 1.0 {
            return None;
        }

        let q = s.cross(e1);
        let v = ray.direction().dot(q) * f;

        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        Some(TriangleHit {
            t: e2.dot(q) * f,
            u,
            v,
        })
    }
}

/// Raw result of a single ray/triangle test; unclipped, see
/// [`Triangle::intersect()`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleHit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TriangleId(u32);

impl TriangleId {
    pub const NONE: Self = Self(u32::MAX);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}
