use crate::{InstanceId, TriangleId};

/// Closest hit found so far along one ray; what the traversal ultimately
/// hands to the shading stage.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Intersection {
    pub distance: f32,
    pub u: f32,
    pub v: f32,
    pub instance_id: InstanceId,
    pub triangle_id: TriangleId,
}

impl Intersection {
    /// The miss sentinel: distance pinned at the far clip, ids unset.
    pub fn none(t_far: f32) -> Self {
        Self {
            distance: t_far,
            u: -1.0,
            v: -1.0,
            instance_id: InstanceId::NONE,
            triangle_id: TriangleId::NONE,
        }
    }

    pub fn is_some(&self) -> bool {
        self.triangle_id != TriangleId::NONE
    }

    pub fn is_none(&self) -> bool {
        !self.is_some()
    }
}
