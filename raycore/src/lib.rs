//! Host side of Raycore: owned scene stores, BVH construction and
//! validation, and the data-parallel trace / cull dispatches.

mod bvh;
mod culler;
mod geometry;
mod instances;
mod renderer;
mod scene;

pub use raycore_kernels::*;

pub use self::bvh::*;
pub use self::culler::*;
pub use self::geometry::*;
pub use self::instances::*;
pub use self::renderer::*;
pub use self::scene::*;
