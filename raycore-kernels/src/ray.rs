use glam::{Mat4, Vec3};

use crate::{BvhNode, InstanceId, Intersection, TriangleId, World, BVH_STACK_SIZE};

#[derive(Copy, Clone, Debug, Default)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalize();

        Self {
            origin,
            direction,
            inv_direction: 1.0 / direction,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Slab test against an axis-aligned box, bounded to the `(t_near,
    /// t_far)` segment.
    ///
    /// Zero direction components divide into IEEE infinities (or NaN when the
    /// origin sits exactly on a slab), both of which the min/max reduction
    /// absorbs. Convention: slab overlap is inclusive, segment ends are
    /// exclusive.
    pub fn hits_box(
        &self,
        bounds_min: Vec3,
        bounds_max: Vec3,
        t_near: f32,
        t_far: f32,
    ) -> bool {
        let t1 = (bounds_min - self.origin) * self.inv_direction;
        let t2 = (bounds_max - self.origin) * self.inv_direction;

        let tmin = t1.min(t2).max_element();
        let tmax = t1.max(t2).min_element();

        tmin <= tmax && tmax > t_near && tmin < t_far
    }

    /// Folds this ray into an instance's local frame.
    ///
    /// Maps the origin and the segment's far end as *points* and rebuilds the
    /// direction from their difference; transforming the direction vector
    /// alone would skew `t` under non-uniform instance scale.
    pub fn to_local(&self, inv_transform: Mat4, t_far: f32) -> Self {
        let origin = inv_transform.transform_point3(self.origin);
        let dest = inv_transform.transform_point3(self.at(t_far));

        Self::new(origin, dest - origin)
    }

    /// Traces this ray through the hierarchy and returns its nearest hit,
    /// keeping yet-to-be-visited nodes on an explicit stack.
    pub fn trace_nearest(
        &self,
        world: &World,
        t_near: f32,
        t_far: f32,
    ) -> Intersection {
        let mut best = Intersection::none(t_far);

        let mut stack = [0; BVH_STACK_SIZE];
        let mut stack_len = 1;

        while stack_len > 0 {
            stack_len -= 1;

            let node = world.bvh.node(stack[stack_len]);

            if !self.hits_box(node.bounds_min(), node.bounds_max(), t_near, t_far)
            {
                continue;
            }

            if node.is_leaf() {
                self.intersect_leaf(world, &node, t_near, t_far, &mut best);
            } else {
                debug_assert!(stack_len + 2 <= BVH_STACK_SIZE);

                stack[stack_len] = node.left_child();
                stack[stack_len + 1] = node.left_child() + 1;
                stack_len += 2;
            }
        }

        best
    }

    /// Traces without an auxiliary stack, walking parent links instead.
    ///
    /// Each node is entered in one of three ways (from its parent, from its
    /// sibling, or back up from a child) and the (node, arrival) pair fully
    /// determines the next move. Costs extra box re-tests, needs O(1) memory.
    pub fn trace_nearest_stackless(
        &self,
        world: &World,
        t_near: f32,
        t_far: f32,
    ) -> Intersection {
        let mut best = Intersection::none(t_far);

        let bvh = world.bvh;
        let root = bvh.node(0);

        if !self.hits_box(root.bounds_min(), root.bounds_max(), t_near, t_far) {
            return best;
        }

        if root.is_leaf() {
            self.intersect_leaf(world, &root, t_near, t_far, &mut best);
            return best;
        }

        let mut current = root.left_child();
        let mut arrival = Arrival::FromParent;

        // Bounds the walk on malformed trees: a well-formed walk enters every
        // node at most once per arrival mode.
        let mut remaining = 3 * bvh.node_count() + 2;

        while current != 0 && remaining > 0 {
            remaining -= 1;

            let node = bvh.node(current);

            (current, arrival) = match arrival {
                Arrival::FromParent => {
                    if !self.hits_box(
                        node.bounds_min(),
                        node.bounds_max(),
                        t_near,
                        t_far,
                    ) {
                        (bvh.sibling_of(current), Arrival::FromSibling)
                    } else if !node.is_leaf() {
                        (node.left_child(), Arrival::FromParent)
                    } else {
                        self.intersect_leaf(
                            world, &node, t_near, t_far, &mut best,
                        );

                        (bvh.sibling_of(current), Arrival::FromSibling)
                    }
                }

                Arrival::FromSibling => {
                    if !self.hits_box(
                        node.bounds_min(),
                        node.bounds_max(),
                        t_near,
                        t_far,
                    ) {
                        (node.parent(), Arrival::FromChild)
                    } else if !node.is_leaf() {
                        (node.left_child(), Arrival::FromParent)
                    } else {
                        self.intersect_leaf(
                            world, &node, t_near, t_far, &mut best,
                        );

                        (node.parent(), Arrival::FromChild)
                    }
                }

                Arrival::FromChild => {
                    if current == bvh.left_child_of(node.parent()) {
                        (bvh.sibling_of(current), Arrival::FromSibling)
                    } else {
                        (node.parent(), Arrival::FromChild)
                    }
                }
            };
        }

        best
    }

    /// Brute-force reference traversal: every instance against every template
    /// triangle, no hierarchy involved.
    pub fn trace_nearest_naive(
        &self,
        world: &World,
        t_near: f32,
        t_far: f32,
    ) -> Intersection {
        let mut best = Intersection::none(t_far);

        for instance in 0..world.instances.len() {
            let instance_id = InstanceId::new(instance);

            let local_ray = self.to_local(
                world.instances.get(instance_id).inv_transform(),
                t_far,
            );

            for triangle in 0..world.geometry.triangle_count() {
                let triangle_id = TriangleId::new(triangle);

                let Some(hit) =
                    world.geometry.triangle(triangle_id).intersect(local_ray)
                else {
                    continue;
                };

                if t_near < hit.t && hit.t < best.distance {
                    best = Intersection {
                        distance: hit.t,
                        u: hit.u,
                        v: hit.v,
                        instance_id,
                        triangle_id,
                    };
                }
            }
        }

        best
    }

    /// Tests every (instance, triangle) pair referenced by a leaf, folding
    /// the ray into each instance's local frame first.
    fn intersect_leaf(
        &self,
        world: &World,
        node: &BvhNode,
        t_near: f32,
        t_far: f32,
        best: &mut Intersection,
    ) {
        for i in 0..node.leaf_count() {
            let (instance_id, triangle_id) =
                world.bvh.leaf_ref(node.first_leaf() + i);

            let local_ray = self.to_local(
                world.instances.get(instance_id).inv_transform(),
                t_far,
            );

            let Some(hit) =
                world.geometry.triangle(triangle_id).intersect(local_ray)
            else {
                continue;
            };

            if t_near < hit.t && hit.t < best.distance {
                *best = Intersection {
                    distance: hit.t,
                    u: hit.u,
                    v: hit.v,
                    instance_id,
                    triangle_id,
                };
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Arrival {
    FromParent,
    FromSibling,
    FromChild,
}
