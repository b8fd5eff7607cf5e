//! Per-dependent cloning of external references.

use crate::metapackage::MetapackageGraph;
use std::collections::VecDeque;

/// Give every dependent of a splittable package its own clone.
///
/// Runs to a fixed point: a clone inherits the forward dependencies of the
/// package it was cut from, so splittable packages further down gain
/// dependents and are queued again. The split package keeps its first
/// dependent. Returns the number of clones created.
pub fn split_shared_references(graph: &mut MetapackageGraph) -> usize {
    let mut queue: VecDeque<_> = graph
        .ids()
        .into_iter()
        .filter(|id| graph[*id].is_splittable())
        .collect();
    let mut clones = 0;

    while let Some(id) = queue.pop_front() {
        if !graph.is_live(id) || !graph[id].is_splittable() {
            continue;
        }
        while let Some(clone) = graph.split(id) {
            clones += 1;
            queue.extend(
                graph[clone]
                    .deps()
                    .iter()
                    .copied()
                    .filter(|dep| graph[*dep].is_splittable()),
            );
        }
    }

    if clones > 0 {
        tracing::debug!("Split shared references into {} extra packages", clones);
    }
    clones
}
