//! Per-device depth ("Function") and parent annotation.

use tracing::{debug, instrument};

use crate::forest::Forest;
use crate::record::DeviceId;

/// Position of one device within its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub device: DeviceId,
    /// Edges between the device and its root; the root itself is 0.
    pub function: u32,
    pub parent: Option<DeviceId>,
    pub root: DeviceId,
}

/// Depth-first walk of every tree in `forest`, roots in ascending id order
/// and children in placement order. Detached devices are not annotated.
#[must_use]
#[instrument(skip_all, fields(roots = forest.roots().len()))]
pub fn annotate(forest: &Forest) -> Vec<Annotation> {
    let mut out = Vec::with_capacity(forest.placed_count());

    for &root in forest.roots() {
        let mut stack = vec![(root, 0u32, None)];
        while let Some((device, function, parent)) = stack.pop() {
            out.push(Annotation {
                device,
                function,
                parent,
                root,
            });
            // reversed so the first-placed child is visited first
            for &child in forest.children(device).iter().rev() {
                stack.push((child, function + 1, Some(device)));
            }
        }
    }

    debug!(annotated = out.len(), "annotated devices");
    out
}
