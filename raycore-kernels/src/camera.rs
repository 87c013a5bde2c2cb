use bytemuck::{Pod, Zeroable};
use glam::{uvec2, vec2, Mat4, UVec2, Vec4, Vec4Swizzles};

use crate::Ray;

/// Per-dispatch camera state: the inverse view-projection used to unproject
/// pixels, plus the screen size and the global clip range.
///
/// `screen` packs `(width, height, t_near, t_far)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct Camera {
    pub ndc_to_world: Mat4,
    pub screen: Vec4,
}

impl Camera {
    pub fn new(
        ndc_to_world: Mat4,
        size: UVec2,
        t_near: f32,
        t_far: f32,
    ) -> Self {
        Self {
            ndc_to_world,
            screen: vec2(size.x as f32, size.y as f32)
                .extend(t_near)
                .extend(t_far),
        }
    }

    pub fn screen_size(&self) -> UVec2 {
        self.screen.xy().as_uvec2()
    }

    pub fn t_near(&self) -> f32 {
        self.screen.z
    }

    pub fn t_far(&self) -> f32 {
        self.screen.w
    }

    /// Given a point in screen-coordinates, returns a unique index for it;
    /// used to address per-pixel output buffers.
    pub fn screen_to_idx(&self, pos: UVec2) -> usize {
        (pos.y * (self.screen.x as u32) + pos.x) as usize
    }

    pub fn idx_to_screen(&self, idx: usize) -> UVec2 {
        let width = self.screen.x as u32;

        uvec2(idx as u32 % width, idx as u32 / width)
    }

    /// Casts the primary ray through the given pixel's center.
    ///
    /// Both the near- and the far-plane point are unprojected and the
    /// direction is taken from their difference (reverse-z: the near plane
    /// sits at ndc depth 1).
    pub fn ray(&self, screen_pos: UVec2) -> Ray {
        let ndc =
            (screen_pos.as_vec2() + 0.5) * 2.0 / self.screen.xy() - 1.0;

        let ndc = vec2(ndc.x, -ndc.y);

        let near_plane =
            self.ndc_to_world.project_point3(ndc.extend(1.0));

        let far_plane =
            self.ndc_to_world.project_point3(ndc.extend(f32::EPSILON));

        Ray::new(near_plane, far_plane - near_plane)
    }
}
