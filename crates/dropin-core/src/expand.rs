//! Folding virtual packages into named ones.

use crate::catalog::Catalog;
use crate::error::InstallError;
use crate::metapackage::{MetapackageGraph, PackageId};

/// Merge every virtual package into its only dependent, or into the main
/// package when nothing depends on it.
///
/// If no live package carries `main` yet, the first dependent-less virtual
/// package is promoted to it. Scans repeat until nothing changes; packages
/// with several dependents are revisited since merging their siblings can
/// shrink the dependent set.
///
/// Returns the number of merges performed.
///
/// # Errors
///
/// Returns [`InstallError::UnmergedVirtualPackages`] if virtual packages
/// remain at the fixed point. The error carries a dump of each one and its
/// dependents.
pub fn expand_virtual_packages(
    graph: &mut MetapackageGraph,
    main: &str,
    catalog: &Catalog<'_>,
) -> Result<usize, InstallError> {
    let mut main_id = graph.ids().into_iter().find(|id| graph[*id].has_name(main));
    let mut merges = 0;

    loop {
        let mut progressed = false;

        for id in graph.ids() {
            if !graph.is_live(id) || !graph[id].is_virtual() {
                continue;
            }
            let revdeps = graph[id].revdeps();
            match (revdeps.len(), revdeps.first().copied()) {
                (0, _) => match main_id {
                    Some(main_id) => {
                        tracing::debug!("Merging {} into main package {}", id, main);
                        graph.merge(main_id, id);
                        merges += 1;
                    }
                    None => {
                        tracing::debug!("Promoting {} to main package {}", id, main);
                        graph.promote(id, main);
                        main_id = Some(id);
                    }
                },
                (1, Some(owner)) => {
                    tracing::debug!("Merging {} into its only dependent {}", id, owner);
                    graph.merge(owner, id);
                    merges += 1;
                }
                _ => continue,
            }
            progressed = true;
        }

        if !progressed {
            break;
        }
    }

    let unmerged: Vec<PackageId> = graph
        .ids()
        .into_iter()
        .filter(|id| graph[*id].is_virtual())
        .collect();
    if unmerged.is_empty() {
        return Ok(merges);
    }

    let mut dump = String::new();
    for id in &unmerged {
        let entry = graph.dump(*id, catalog);
        tracing::info!("Unmerged virtual package:\n{}", entry);
        dump.push_str(&entry);
    }
    Err(InstallError::UnmergedVirtualPackages {
        count: unmerged.len(),
        dump,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metapackage::tests::assert_symmetric;
    use crate::repository::StaticRepository;
    use dropin_schema::{Unit, Version};

    fn units(n: usize) -> Vec<Unit> {
        (0..n)
            .map(|i| Unit::new(format!("u{i}"), Version::new(1, 0, 0)))
            .collect()
    }

    #[test]
    fn test_all_virtual_collapses_onto_main() {
        let reactor = units(3);
        let repo = StaticRepository::new();
        let catalog = Catalog::new(&reactor, &repo);
        let r = catalog.reactor();

        let mut graph = MetapackageGraph::new();
        let ids: Vec<_> = r.iter().map(|u| graph.add_virtual(*u, false)).collect();
        graph.add_dependency(ids[0], ids[1]);

        expand_virtual_packages(&mut graph, "main", &catalog).unwrap();
        assert_eq!(graph.len(), 1);
        let main = graph.ids()[0];
        assert!(graph[main].has_name("main"));
        assert_eq!(graph[main].units().len(), 3);
    }

    #[test]
    fn test_existing_main_receives_orphans() {
        let reactor = units(2);
        let repo = StaticRepository::new();
        let catalog = Catalog::new(&reactor, &repo);
        let r = catalog.reactor();

        let mut graph = MetapackageGraph::new();
        let main = graph.add_physical("main", [r[0]]);
        graph.add_virtual(r[1], false);

        assert_eq!(expand_virtual_packages(&mut graph, "main", &catalog).unwrap(), 1);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph[main].units().len(), 2);
    }

    #[test]
    fn test_single_dependent_absorbs_reference() {
        let reactor = units(3);
        let repo = StaticRepository::new();
        let catalog = Catalog::new(&reactor, &repo);
        let r = catalog.reactor();

        let mut graph = MetapackageGraph::new();
        let sub = graph.add_physical("sub", [r[0]]);
        let ext = graph.add_virtual(r[1], true);
        let deeper = graph.add_virtual(r[2], true);
        graph.add_dependency(sub, ext);
        graph.add_dependency(ext, deeper);

        expand_virtual_packages(&mut graph, "main", &catalog).unwrap();
        assert_eq!(graph.ids(), vec![sub]);
        assert_eq!(graph[sub].units().len(), 3);
        assert_symmetric(&graph);
    }

    #[test]
    fn test_shared_package_becomes_mergeable_after_siblings() {
        let reactor = units(3);
        let repo = StaticRepository::new();
        let catalog = Catalog::new(&reactor, &repo);
        let r = catalog.reactor();

        // shared is required by sub and by v, and v only by sub
        let mut graph = MetapackageGraph::new();
        let shared = graph.add_virtual(r[0], false);
        let sub = graph.add_physical("sub", [r[1]]);
        let v = graph.add_virtual(r[2], false);
        graph.add_dependency(sub, shared);
        graph.add_dependency(sub, v);
        graph.add_dependency(v, shared);

        expand_virtual_packages(&mut graph, "main", &catalog).unwrap();
        assert_eq!(graph.ids(), vec![sub]);
        assert_eq!(graph[sub].units().len(), 3);
    }

    #[test]
    fn test_shared_virtual_is_fatal() {
        let reactor = units(3);
        let repo = StaticRepository::new();
        let catalog = Catalog::new(&reactor, &repo);
        let r = catalog.reactor();

        let mut graph = MetapackageGraph::new();
        let sub1 = graph.add_physical("sub1", [r[0]]);
        let sub2 = graph.add_physical("sub2", [r[2]]);
        let b = graph.add_virtual(r[1], false);
        graph.add_dependency(sub1, b);
        graph.add_dependency(sub2, b);

        let err = expand_virtual_packages(&mut graph, "main", &catalog).unwrap_err();
        match err {
            InstallError::UnmergedVirtualPackages { count, dump } => {
                assert_eq!(count, 1);
                assert!(dump.contains("* u1 1.0.0"));
                assert!(dump.contains("Physical package sub1:"));
                assert!(dump.contains("Physical package sub2:"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
