use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;
use raycore_kernels::{BoundingBox, Frustum};

/// Tests every object's world-space box against the frustum (one object per
/// work item) and compacts the indices of visible ones through a shared
/// atomic counter.
///
/// The visible *set* is deterministic; the order within the output is not,
/// matching what an indirect-draw consumer expects.
pub fn cull_boxes(frustum: &Frustum, bounds: &[BoundingBox]) -> Vec<u32> {
    let visible_count = AtomicU32::new(0);

    let slots: Vec<AtomicU32> =
        (0..bounds.len()).map(|_| AtomicU32::new(0)).collect();

    bounds.par_iter().enumerate().for_each(|(idx, bb)| {
        if frustum.contains_box(bb.min(), bb.max()) {
            let slot = visible_count.fetch_add(1, Ordering::Relaxed);

            slots[slot as usize].store(idx as u32, Ordering::Relaxed);
        }
    });

    let count = visible_count.into_inner() as usize;

    slots
        .into_iter()
        .take(count)
        .map(AtomicU32::into_inner)
        .collect()
}
