use bytemuck::{Pod, Zeroable};
use glam::{ivec4, IVec4, Vec3, Vec4, Vec4Swizzles};

use crate::{BoundingBox, InstanceId, TriangleId};

/// One node of the flattened hierarchy.
///
/// `links` packs `(left_child | -1, first_leaf, leaf_count, parent | -1)`;
/// a node is a leaf iff `leaf_count > 0`. Children are always allocated as an
/// adjacent index pair, so `left_child + 1` is the right child. Node 0 is the
/// root and the only node whose parent is -1.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BvhNode {
    bounds_min: Vec4,
    bounds_max: Vec4,
    links: IVec4,
}

impl BvhNode {
    pub fn leaf(
        bounds: BoundingBox,
        first_leaf: i32,
        leaf_count: i32,
        parent: i32,
    ) -> Self {
        Self {
            bounds_min: bounds.min().extend(0.0),
            bounds_max: bounds.max().extend(0.0),
            links: ivec4(-1, first_leaf, leaf_count, parent),
        }
    }

    pub fn interior(bounds: BoundingBox, left_child: i32, parent: i32) -> Self {
        Self {
            bounds_min: bounds.min().extend(0.0),
            bounds_max: bounds.max().extend(0.0),
            links: ivec4(left_child, -1, 0, parent),
        }
    }

    pub fn bounds_min(&self) -> Vec3 {
        self.bounds_min.xyz()
    }

    pub fn bounds_max(&self) -> Vec3 {
        self.bounds_max.xyz()
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.bounds_min(), self.bounds_max())
    }

    pub fn set_bounds(&mut self, bounds: BoundingBox) {
        self.bounds_min = bounds.min().extend(0.0);
        self.bounds_max = bounds.max().extend(0.0);
    }

    pub fn left_child(&self) -> i32 {
        self.links.x
    }

    pub fn first_leaf(&self) -> i32 {
        self.links.y
    }

    pub fn leaf_count(&self) -> i32 {
        self.links.z
    }

    pub fn parent(&self) -> i32 {
        self.links.w
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf_count() > 0
    }
}

/// Read-only view of the flattened hierarchy: the node array plus the
/// leaf-reference array its leaves point into.
#[derive(Clone, Copy)]
pub struct BvhView<'a> {
    nodes: &'a [BvhNode],
    leaf_refs: &'a [u32],
    triangles_per_instance: u32,
}

impl<'a> BvhView<'a> {
    pub fn new(
        nodes: &'a [BvhNode],
        leaf_refs: &'a [u32],
        triangles_per_instance: u32,
    ) -> Self {
        Self {
            nodes,
            leaf_refs,
            triangles_per_instance,
        }
    }

    pub fn node(&self, idx: i32) -> BvhNode {
        self.nodes[idx as usize]
    }

    pub fn node_count(&self) -> i32 {
        self.nodes.len() as i32
    }

    /// Decodes one leaf reference into its (instance, triangle) pair.
    pub fn leaf_ref(&self, idx: i32) -> (InstanceId, TriangleId) {
        let leaf_ref = self.leaf_refs[idx as usize];

        (
            InstanceId::new(leaf_ref / self.triangles_per_instance),
            TriangleId::new(leaf_ref % self.triangles_per_instance),
        )
    }

    pub fn parent_of(&self, idx: i32) -> i32 {
        self.node(idx).parent()
    }

    pub fn left_child_of(&self, idx: i32) -> i32 {
        self.node(idx).left_child()
    }

    /// Children are stored as adjacent pairs, so a node's sibling is the slot
    /// after its parent's left child.
    pub fn sibling_of(&self, idx: i32) -> i32 {
        self.left_child_of(self.parent_of(idx)) + 1
    }
}
