use glam::Mat4;
use raycore_kernels::{Instance, InstanceId, InstancesView};

/// The per-scene instance table; each transform is inverted once on insert
/// and both matrices stay immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct Instances {
    instances: Vec<Instance>,
}

impl Instances {
    pub fn push(&mut self, transform: Mat4) -> InstanceId {
        let id = InstanceId::new(self.instances.len() as u32);

        self.instances.push(Instance::new(transform));

        id
    }

    pub fn set(&mut self, id: InstanceId, transform: Mat4) {
        self.instances[id.get() as usize] = Instance::new(transform);
    }

    pub fn get(&self, id: InstanceId) -> Instance {
        self.instances[id.get() as usize]
    }

    pub fn len(&self) -> u32 {
        self.instances.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn view(&self) -> InstancesView<'_> {
        InstancesView::new(&self.instances)
    }
}
