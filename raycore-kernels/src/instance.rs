use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// One rigid placement of the template mesh in the world.
///
/// The inverse transform is computed once here and trusted afterwards; the
/// traversal folds rays through it instead of inverting per ray.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Instance {
    transform: Mat4,
    inv_transform: Mat4,
}

impl Instance {
    pub fn new(transform: Mat4) -> Self {
        Self {
            transform,
            inv_transform: transform.inverse(),
        }
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn inv_transform(&self) -> Mat4 {
        self.inv_transform
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InstanceId(u32);

impl InstanceId {
    pub const NONE: Self = Self(u32::MAX);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy)]
pub struct InstancesView<'a> {
    data: &'a [Instance],
}

impl<'a> InstancesView<'a> {
    pub fn new(data: &'a [Instance]) -> Self {
        Self { data }
    }

    pub fn get(&self, id: InstanceId) -> Instance {
        self.data[id.get() as usize]
    }

    pub fn len(&self) -> u32 {
        self.data.len() as u32
    }
}
