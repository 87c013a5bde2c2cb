mod builder;

use raycore_kernels::{BoundingBox, BvhNode, BvhView, BVH_STACK_SIZE};
use thiserror::Error;

pub use self::builder::BvhTriangle;

/// The flattened hierarchy over the instanced triangle set: a node array
/// (root at index 0) plus the leaf-reference array its leaves point into.
///
/// Built once per scene, either in-repo via [`Bvh::build()`] or upstream and
/// handed in through [`Bvh::from_parts()`], and read-only for every dispatch
/// afterwards.
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    leaf_refs: Vec<u32>,
    triangles_per_instance: u32,
    depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BvhError {
    #[error("hierarchy has no nodes")]
    Empty,

    #[error("node {node}: child index {child} is out of range")]
    ChildOutOfRange { node: usize, child: i32 },

    #[error("node {node}: parent link is {parent}, expected {expected}")]
    ParentMismatch {
        node: usize,
        parent: i32,
        expected: i32,
    },

    #[error("node {node}: leaf references are out of range")]
    LeafRefsOutOfRange { node: usize },

    #[error("tree depth {depth} exceeds what the traversal stack can hold")]
    TooDeep { depth: usize },
}

impl Bvh {
    /// Builds the hierarchy over the given world-space triangles using
    /// binned SAH splits.
    pub fn build(
        triangles: &[BvhTriangle],
        triangles_per_instance: u32,
    ) -> Result<Self, BvhError> {
        builder::build(triangles, triangles_per_instance)
    }

    /// Wraps externally built arrays, checking the structural invariants the
    /// traversal later relies on instead of re-checking them per ray.
    pub fn from_parts(
        nodes: Vec<BvhNode>,
        leaf_refs: Vec<u32>,
        triangles_per_instance: u32,
    ) -> Result<Self, BvhError> {
        let depth = validate(&nodes, &leaf_refs)?;

        Ok(Self {
            nodes,
            leaf_refs,
            triangles_per_instance,
            depth,
        })
    }

    /// Refits node bounds to moved (still rigidly instanced) triangles
    /// without re-splitting: leaves are recomputed from their triangles and
    /// parents merge their children's boxes, walking the array in reverse
    /// index order (children always sit after their parent).
    ///
    /// `triangles` must be indexed by leaf reference, i.e. laid out
    /// instance-major like the build input.
    pub fn refit(&mut self, triangles: &[BvhTriangle]) {
        for idx in (0..self.nodes.len()).rev() {
            let node = self.nodes[idx];

            let bounds = if node.is_leaf() {
                let first = node.first_leaf() as usize;
                let count = node.leaf_count() as usize;

                self.leaf_refs[first..first + count].iter().fold(
                    BoundingBox::default(),
                    |bounds, &leaf_ref| {
                        bounds + triangles[leaf_ref as usize].bounds
                    },
                )
            } else {
                let left = node.left_child() as usize;

                self.nodes[left].bounds() + self.nodes[left + 1].bounds()
            };

            self.nodes[idx].set_bounds(bounds);
        }
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn leaf_refs(&self) -> &[u32] {
        &self.leaf_refs
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn view(&self) -> BvhView<'_> {
        BvhView::new(&self.nodes, &self.leaf_refs, self.triangles_per_instance)
    }
}

/// Walks the tree from the root, checking links, leaf ranges and depth;
/// returns the tree's depth.
fn validate(nodes: &[BvhNode], leaf_refs: &[u32]) -> Result<usize, BvhError> {
    if nodes.is_empty() {
        return Err(BvhError::Empty);
    }

    if nodes[0].parent() != -1 {
        return Err(BvhError::ParentMismatch {
            node: 0,
            parent: nodes[0].parent(),
            expected: -1,
        });
    }

    let mut max_depth = 0;
    let mut pending = vec![(0, 1)];

    while let Some((idx, depth)) = pending.pop() {
        max_depth = max_depth.max(depth);

        let node = nodes[idx as usize];

        if node.is_leaf() {
            let first = node.first_leaf();
            let count = node.leaf_count();

            if first < 0 || (first + count) as usize > leaf_refs.len() {
                return Err(BvhError::LeafRefsOutOfRange {
                    node: idx as usize,
                });
            }
        } else {
            let left = node.left_child();

            for child in [left, left + 1] {
                // Children must come after their parent; together with the
                // back-link check this rules out cycles and sharing.
                if child <= idx || child as usize >= nodes.len() {
                    return Err(BvhError::ChildOutOfRange {
                        node: idx as usize,
                        child,
                    });
                }

                if nodes[child as usize].parent() != idx {
                    return Err(BvhError::ParentMismatch {
                        node: child as usize,
                        parent: nodes[child as usize].parent(),
                        expected: idx,
                    });
                }

                pending.push((child, depth + 1));
            }
        }
    }

    if 2 * max_depth > BVH_STACK_SIZE {
        return Err(BvhError::TooDeep { depth: max_depth });
    }

    Ok(max_depth)
}

#[cfg(test)]
mod tests {
    use glam::vec3;
    use raycore_kernels::BoundingBox;

    use super::*;

    fn bounds() -> BoundingBox {
        BoundingBox::new(vec3(-1.0, -1.0, -1.0), vec3(1.0, 1.0, 1.0))
    }

    /// Root with two leaves, one reference each.
    fn small_tree() -> Vec<BvhNode> {
        vec![
            BvhNode::interior(bounds(), 1, -1),
            BvhNode::leaf(bounds(), 0, 1, 0),
            BvhNode::leaf(bounds(), 1, 1, 0),
        ]
    }

    #[test]
    fn from_parts_accepts_a_well_formed_tree() {
        let bvh = Bvh::from_parts(small_tree(), vec![0, 1], 12).unwrap();

        assert_eq!(bvh.node_count(), 3);
        assert_eq!(bvh.depth(), 2);
    }

    #[test]
    fn from_parts_rejects_empty_trees() {
        assert_eq!(
            Bvh::from_parts(vec![], vec![], 12).unwrap_err(),
            BvhError::Empty,
        );
    }

    #[test]
    fn from_parts_rejects_dangling_children() {
        let mut nodes = small_tree();
        nodes[0] = BvhNode::interior(bounds(), 5, -1);

        assert_eq!(
            Bvh::from_parts(nodes, vec![0, 1], 12).unwrap_err(),
            BvhError::ChildOutOfRange { node: 0, child: 5 },
        );
    }

    #[test]
    fn from_parts_rejects_broken_parent_links() {
        let mut nodes = small_tree();
        nodes[2] = BvhNode::leaf(bounds(), 1, 1, 1);

        assert_eq!(
            Bvh::from_parts(nodes, vec![0, 1], 12).unwrap_err(),
            BvhError::ParentMismatch {
                node: 2,
                parent: 1,
                expected: 0,
            },
        );
    }

    #[test]
    fn from_parts_rejects_leaves_pointing_past_the_references() {
        let nodes = small_tree();

        assert_eq!(
            Bvh::from_parts(nodes, vec![0], 12).unwrap_err(),
            BvhError::LeafRefsOutOfRange { node: 2 },
        );
    }

    #[test]
    fn from_parts_rejects_trees_deeper_than_the_stack() {
        // A degenerate spine: every interior node hangs a leaf off its left
        // slot and continues down its right slot.
        let mut nodes = Vec::new();

        for level in 0..32 {
            let idx = 2 * level;
            let parent = if level == 0 { -1 } else { idx - 2 };

            nodes.push(BvhNode::interior(bounds(), idx + 1, parent));
            nodes.push(BvhNode::leaf(bounds(), 0, 1, idx));
        }

        nodes.push(BvhNode::leaf(bounds(), 0, 1, 62));

        assert_eq!(
            Bvh::from_parts(nodes, vec![0], 12).unwrap_err(),
            BvhError::TooDeep { depth: 33 },
        );
    }
}
