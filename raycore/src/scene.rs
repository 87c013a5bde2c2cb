use glam::{Mat4, Vec4Swizzles};
use raycore_kernels::{BoundingBox, InstanceId, TriangleId, World};

use crate::{Bvh, BvhError, BvhTriangle, Geometry, Instances};

/// Owns the per-scene stores and keeps the hierarchy in sync with them.
///
/// Everything here is immutable for the duration of a dispatch; rebuilding
/// and refitting happen between frames.
#[derive(Debug)]
pub struct Scene {
    geometry: Geometry,
    instances: Instances,
    bvh: Option<Bvh>,
}

impl Scene {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            instances: Instances::default(),
            bvh: None,
        }
    }

    pub fn push_instance(&mut self, transform: Mat4) -> InstanceId {
        self.bvh = None;

        self.instances.push(transform)
    }

    /// Moves an instance; call [`Self::refit()`] (cheap) or
    /// [`Self::rebuild()`] (better tree) afterwards.
    pub fn set_instance_transform(
        &mut self,
        id: InstanceId,
        transform: Mat4,
    ) {
        self.instances.set(id, transform);
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn instances(&self) -> &Instances {
        &self.instances
    }

    /// Flattens the instanced triangle set into world space and rebuilds the
    /// hierarchy over it.
    pub fn rebuild(&mut self) -> Result<(), BvhError> {
        let triangles = self.world_triangles();
        let bvh = Bvh::build(&triangles, self.geometry.triangle_count())?;

        log::info!(
            "rebuilt bvh; instances={} triangles={} nodes={} depth={}",
            self.instances.len(),
            triangles.len(),
            bvh.node_count(),
            bvh.depth(),
        );

        self.bvh = Some(bvh);

        Ok(())
    }

    /// Refits the existing hierarchy to the instances' current transforms
    /// without re-splitting it.
    pub fn refit(&mut self) {
        if let Some(bvh) = &mut self.bvh {
            let triangles = triangles_of(&self.geometry, &self.instances);

            bvh.refit(&triangles);
        }
    }

    /// Read-only views for a dispatch; `None` until the first rebuild.
    pub fn world(&self) -> Option<World<'_>> {
        let bvh = self.bvh.as_ref()?;

        Some(World {
            geometry: self.geometry.view(),
            instances: self.instances.view(),
            bvh: bvh.view(),
        })
    }

    /// Per-instance world-space bounds, for the frustum-culling dispatch.
    pub fn instance_bounds(&self) -> Vec<BoundingBox> {
        (0..self.instances.len())
            .map(|idx| {
                let transform =
                    self.instances.get(InstanceId::new(idx)).transform();

                BoundingBox::from_points(
                    self.geometry.vertices().iter().map(|vertex| {
                        transform.transform_point3(vertex.position.xyz())
                    }),
                )
            })
            .collect()
    }

    fn world_triangles(&self) -> Vec<BvhTriangle> {
        triangles_of(&self.geometry, &self.instances)
    }
}

/// Flattens every (instance, triangle) pair into world space, instance-major,
/// so triangle `t` of instance `m` lands at leaf reference
/// `m * triangle_count + t`.
fn triangles_of(
    geometry: &Geometry,
    instances: &Instances,
) -> Vec<BvhTriangle> {
    let view = geometry.view();
    let triangle_count = geometry.triangle_count();

    let mut triangles =
        Vec::with_capacity((instances.len() * triangle_count) as usize);

    for m in 0..instances.len() {
        let transform = instances.get(InstanceId::new(m)).transform();

        for t in 0..triangle_count {
            let triangle = view.triangle(TriangleId::new(t));

            triangles.push(BvhTriangle::new(
                triangle
                    .positions()
                    .map(|position| transform.transform_point3(position)),
                m * triangle_count + t,
            ));
        }
    }

    triangles
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, Vec3};
    use raycore_kernels::{Intersection, Ray};

    use super::*;
    use crate::Geometry;

    const T_NEAR: f32 = 0.1;
    const T_FAR: f32 = 100.0;

    fn cube_scene(transforms: &[Mat4]) -> Scene {
        let mut scene = Scene::new(Geometry::unit_cube());

        for &transform in transforms {
            scene.push_instance(transform);
        }

        scene.rebuild().unwrap();
        scene
    }

    fn trace_all(scene: &Scene, ray: Ray) -> [Intersection; 3] {
        let world = scene.world().unwrap();

        [
            ray.trace_nearest(&world, T_NEAR, T_FAR),
            ray.trace_nearest_stackless(&world, T_NEAR, T_FAR),
            ray.trace_nearest_naive(&world, T_NEAR, T_FAR),
        ]
    }

    /// Both hierarchy traversals and the brute-force oracle must return the
    /// same closest hit.
    fn assert_traversals_agree(scene: &Scene, ray: Ray) -> Intersection {
        let [stack, stackless, naive] = trace_all(scene, ray);

        for other in [stackless, naive] {
            assert_eq!(stack.instance_id, other.instance_id);
            assert_eq!(stack.triangle_id, other.triangle_id);

            if stack.is_some() {
                assert_relative_eq!(
                    stack.distance,
                    other.distance,
                    epsilon = 1e-4
                );
                assert_relative_eq!(stack.u, other.u, epsilon = 1e-4);
                assert_relative_eq!(stack.v, other.v, epsilon = 1e-4);
            }
        }

        stack
    }

    #[test]
    fn hits_the_facing_side_of_a_cube() {
        let scene = cube_scene(&[Mat4::IDENTITY]);

        let hit = assert_traversals_agree(
            &scene,
            Ray::new(vec3(0.0, 0.0, 5.0), vec3(0.0, 0.0, -1.0)),
        );

        assert!(hit.is_some());
        assert_relative_eq!(hit.distance, 4.5, epsilon = 1e-3);
        assert!(hit.u >= 0.0);
        assert!(hit.v >= 0.0);
        assert!(hit.u + hit.v <= 1.0);
    }

    #[test]
    fn misses_cleanly() {
        let scene = cube_scene(&[Mat4::IDENTITY]);

        let hit = assert_traversals_agree(
            &scene,
            Ray::new(vec3(10.0, 10.0, 10.0), vec3(1.0, 0.0, 0.0)),
        );

        assert!(hit.is_none());
        assert_eq!(hit.distance, T_FAR);
    }

    #[test]
    fn traversals_agree_on_single_instance_hits() {
        let scene = cube_scene(&[
            Mat4::from_translation(vec3(-3.0, 0.0, 0.0)),
            Mat4::from_translation(vec3(3.0, 0.0, 0.0)),
        ]);

        let hit = assert_traversals_agree(
            &scene,
            Ray::new(vec3(-3.0, 0.0, 5.0), vec3(0.0, 0.0, -1.0)),
        );

        assert!(hit.is_some());
        assert_eq!(hit.instance_id, InstanceId::new(0));
        assert_relative_eq!(hit.distance, 4.5, epsilon = 1e-3);
    }

    #[test]
    fn traversals_agree_on_empty_regions_between_subtrees() {
        let scene = cube_scene(&[
            Mat4::from_translation(vec3(-3.0, 0.0, 0.0)),
            Mat4::from_translation(vec3(3.0, 0.0, 0.0)),
        ]);

        // Straight through the gap between the two subtrees.
        let hit = assert_traversals_agree(
            &scene,
            Ray::new(vec3(0.0, 0.0, 5.0), vec3(0.0, 0.0, -1.0)),
        );

        assert!(hit.is_none());
    }

    #[test]
    fn traversals_agree_when_an_occluding_box_has_to_be_pruned() {
        // The rotated cube's world-space box is fatter than its geometry, so
        // the ray enters the box, misses every triangle in it, and has to
        // carry on to the axis-aligned cube further behind.
        let scene = cube_scene(&[
            Mat4::from_translation(vec3(0.0, 0.0, 2.0))
                * Mat4::from_rotation_z(45.0_f32.to_radians()),
            Mat4::from_translation(vec3(0.6, 0.55, -3.0)),
        ]);

        // (0.6, 0.55) lies inside the rotated cube's box but outside the
        // diamond its geometry projects to.
        let hit = assert_traversals_agree(
            &scene,
            Ray::new(vec3(0.6, 0.55, 5.0), vec3(0.0, 0.0, -1.0)),
        );

        assert!(hit.is_some());
        assert_eq!(hit.instance_id, InstanceId::new(1));
        assert_relative_eq!(hit.distance, 7.5, epsilon = 1e-3);
    }

    #[test]
    fn returns_the_closest_of_all_valid_hits() {
        let scene = cube_scene(&[
            Mat4::from_translation(vec3(0.0, 0.0, 0.0)),
            Mat4::from_translation(vec3(0.0, 0.0, -2.0)),
            Mat4::from_translation(vec3(0.0, 0.0, 2.0)),
        ]);

        let ray = Ray::new(vec3(0.2, 0.1, 5.0), vec3(0.0, 0.0, -1.0));
        let hit = assert_traversals_agree(&scene, ray);

        assert!(hit.is_some());
        assert_relative_eq!(hit.distance, 2.5, epsilon = 1e-3);

        // Enumerate every intersection along the ray independently of any
        // hierarchy and make sure nothing valid is closer.
        let world = scene.world().unwrap();

        for m in 0..scene.instances().len() {
            let instance_id = InstanceId::new(m);

            let local_ray = ray.to_local(
                scene.instances().get(instance_id).inv_transform(),
                T_FAR,
            );

            for t in 0..scene.geometry().triangle_count() {
                let triangle = world.geometry.triangle(TriangleId::new(t));

                if let Some(other) = triangle.intersect(local_ray) {
                    if other.t > T_NEAR && other.t < T_FAR {
                        assert!(hit.distance <= other.t + 1e-4);
                    }
                }
            }
        }
    }

    #[test]
    fn folded_hits_land_on_the_same_world_point() {
        for transform in [
            Mat4::from_scale(Vec3::splat(2.0)),
            Mat4::from_scale(vec3(2.0, 1.0, 0.5))
                * Mat4::from_rotation_y(30.0_f32.to_radians()),
        ] {
            let scene = cube_scene(&[transform]);
            let ray = Ray::new(vec3(0.2, 0.3, 5.0), vec3(-0.02, 0.01, -1.0));

            let hit = assert_traversals_agree(&scene, ray);
            assert!(hit.is_some());

            let instance = scene.instances().get(hit.instance_id);
            let local_ray = ray.to_local(instance.inv_transform(), T_FAR);

            // Map the instance-local hit point back to world space...
            let local_point = local_ray.at(hit.distance);
            let world_point =
                instance.transform().transform_point3(local_point);

            // ...and cross-check against intersecting the world-transformed
            // triangle with the original world ray.
            let world = scene.world().unwrap();
            let triangle = world.geometry.triangle(hit.triangle_id);

            let world_triangle = raycore_kernels::Triangle::new(
                instance.transform().transform_point3(triangle.v0),
                instance.transform().transform_point3(triangle.v1),
                instance.transform().transform_point3(triangle.v2),
            );

            let expected =
                ray.at(world_triangle.intersect(ray).unwrap().t);

            assert_relative_eq!(world_point.x, expected.x, epsilon = 1e-3);
            assert_relative_eq!(world_point.y, expected.y, epsilon = 1e-3);
            assert_relative_eq!(world_point.z, expected.z, epsilon = 1e-3);
        }
    }

    #[test]
    fn refit_keeps_hits_valid_after_instances_move() {
        let mut scene = cube_scene(&[Mat4::IDENTITY]);
        let id = InstanceId::new(0);

        scene.set_instance_transform(
            id,
            Mat4::from_translation(vec3(0.0, 0.0, -2.0)),
        );
        scene.refit();

        let hit = assert_traversals_agree(
            &scene,
            Ray::new(vec3(0.0, 0.0, 5.0), vec3(0.0, 0.0, -1.0)),
        );

        assert!(hit.is_some());
        assert_relative_eq!(hit.distance, 6.5, epsilon = 1e-3);
    }
}
