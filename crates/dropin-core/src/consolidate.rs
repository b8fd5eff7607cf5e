//! Cycle consolidation.
//!
//! Packages on a dependency cycle cannot be installed separately, so every
//! strongly connected component of the graph is merged into one package.

use crate::catalog::Catalog;
use crate::metapackage::{MetapackageGraph, PackageId};
use indexmap::IndexSet;

#[derive(Debug, Clone, Copy)]
struct Visit {
    index: usize,
    lowlink: usize,
    on_stack: bool,
}

/// Strongly connected components of size two or more, in discovery order.
///
/// Each component lists its root (the first package of the component reached
/// by the search) first. Uses Tarjan's algorithm with an explicit stack, so
/// deep graphs cannot overflow the call stack.
pub fn strong_components(graph: &MetapackageGraph) -> Vec<Vec<PackageId>> {
    let mut visits: Vec<Option<Visit>> = vec![None; graph.capacity()];
    let mut stack: Vec<PackageId> = Vec::new();
    let mut components = Vec::new();
    let mut next_index = 0;

    for start in graph.ids() {
        if visits[start.index()].is_some() {
            continue;
        }

        // (package, position of the next dep to look at)
        let mut frames: Vec<(PackageId, usize)> = vec![(start, 0)];
        visits[start.index()] = Some(Visit {
            index: next_index,
            lowlink: next_index,
            on_stack: true,
        });
        next_index += 1;
        stack.push(start);

        while let Some(frame) = frames.last_mut() {
            let v = frame.0;
            if let Some(&w) = graph[v].deps().get_index(frame.1) {
                frame.1 += 1;
                match visits[w.index()] {
                    None => {
                        visits[w.index()] = Some(Visit {
                            index: next_index,
                            lowlink: next_index,
                            on_stack: true,
                        });
                        next_index += 1;
                        stack.push(w);
                        frames.push((w, 0));
                    }
                    Some(visit) if visit.on_stack => {
                        lower(&mut visits, v, visit.index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            let Some(visit) = visits[v.index()] else {
                continue;
            };
            if let Some(&(parent, _)) = frames.last() {
                lower(&mut visits, parent, visit.lowlink);
            }
            if visit.lowlink != visit.index {
                continue;
            }

            let mut component = Vec::new();
            while let Some(member) = stack.pop() {
                if let Some(visit) = visits[member.index()].as_mut() {
                    visit.on_stack = false;
                }
                component.push(member);
                if member == v {
                    break;
                }
            }
            if component.len() > 1 {
                component.reverse();
                components.push(component);
            }
        }
    }

    components
}

fn lower(visits: &mut [Option<Visit>], id: PackageId, value: usize) {
    if let Some(visit) = visits[id.index()].as_mut() {
        visit.lowlink = visit.lowlink.min(value);
    }
}

/// Merge every dependency cycle into a single package.
///
/// All components are computed before the first merge. A component that
/// joins several explicitly named packages is reported, since those names
/// will now share one package. Returns the number of merges performed.
pub fn consolidate_cycles(graph: &mut MetapackageGraph, catalog: &Catalog<'_>) -> usize {
    let components = strong_components(graph);
    let mut merges = 0;

    for component in components {
        let Some((&root, rest)) = component.split_first() else {
            continue;
        };

        let mut names: IndexSet<String> = IndexSet::new();
        for id in &component {
            names.extend(graph[*id].names().map(str::to_string));
        }
        if names.len() > 1 {
            tracing::warn!(
                "Dependency cycle joins packages {}",
                names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
            );
            for id in &component {
                tracing::debug!("\n{}", graph.describe(*id, catalog));
            }
        }

        for &member in rest {
            graph.merge(root, member);
            merges += 1;
        }
    }

    if merges > 0 {
        tracing::debug!("Merged {} packages to break dependency cycles", merges);
    }
    merges
}
