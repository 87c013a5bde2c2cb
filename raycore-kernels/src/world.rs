use crate::{BvhView, GeometryView, InstancesView};

/// Everything one work item gets to see: read-only views over the scene's
/// flat buffers.
#[derive(Clone, Copy)]
pub struct World<'a> {
    pub geometry: GeometryView<'a>,
    pub instances: InstancesView<'a>,
    pub bvh: BvhView<'a>,
}
