use rayon::prelude::*;
use raycore_kernels::{Camera, Intersection, World};

/// Which traversal the dispatch runs; all three return identical hits, they
/// only differ in memory and control-flow strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Traversal {
    /// Explicit per-ray node stack.
    #[default]
    Stack,
    /// Parent-pointer walk, no auxiliary stack.
    Stackless,
    /// Brute force over every (instance, triangle) pair; the test oracle.
    Naive,
}

/// Traces one primary ray per pixel (every pixel is an independent work
/// item) and collects the per-pixel hits in row-major order, ready for an
/// external shading stage.
pub fn trace_frame(
    camera: &Camera,
    world: &World,
    traversal: Traversal,
) -> Vec<Intersection> {
    let size = camera.screen_size();
    let t_near = camera.t_near();
    let t_far = camera.t_far();

    log::debug!(
        "tracing frame; size={}x{} traversal={:?}",
        size.x,
        size.y,
        traversal,
    );

    (0..(size.x * size.y) as usize)
        .into_par_iter()
        .map(|idx| {
            let ray = camera.ray(camera.idx_to_screen(idx));

            match traversal {
                Traversal::Stack => ray.trace_nearest(world, t_near, t_far),
                Traversal::Stackless => {
                    ray.trace_nearest_stackless(world, t_near, t_far)
                }
                Traversal::Naive => {
                    ray.trace_nearest_naive(world, t_near, t_far)
                }
            }
        })
        .collect()
}
