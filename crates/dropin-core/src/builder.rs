//! Initial metapackage graph.

use crate::catalog::{Catalog, UnitIdx};
use crate::metapackage::{MetapackageGraph, PackageId};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// Which package each unit currently lives in, as seen by the resolver.
pub type PackageLookup = HashMap<UnitIdx, PackageId>;

/// Build one physical package per explicitly named package and one
/// non-splittable virtual package per remaining reactor unit.
///
/// `partial` maps package names to the reactor units explicitly assigned to
/// them, in request order. A unit assigned to several names stays with the
/// first one.
pub fn build_metapackages(
    catalog: &Catalog<'_>,
    partial: &IndexMap<String, IndexSet<UnitIdx>>,
) -> (MetapackageGraph, PackageLookup) {
    let mut graph = MetapackageGraph::new();
    let mut lookup = PackageLookup::new();

    for (name, units) in partial {
        let units: Vec<UnitIdx> = units
            .iter()
            .copied()
            .filter(|unit| !lookup.contains_key(unit))
            .collect();
        let id = graph.add_physical(name.clone(), units.iter().copied());
        for unit in units {
            lookup.insert(unit, id);
        }
    }

    for &unit in catalog.reactor() {
        if !lookup.contains_key(&unit) {
            let id = graph.add_virtual(unit, false);
            lookup.insert(unit, id);
        }
    }

    tracing::debug!(
        "Created {} metapackages ({} explicitly named)",
        graph.len(),
        partial.len()
    );

    (graph, lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::StaticRepository;
    use dropin_schema::{Unit, Version};

    fn reactor() -> Vec<Unit> {
        ["a", "b", "c"]
            .into_iter()
            .map(|id| Unit::new(id, Version::new(1, 0, 0)))
            .collect()
    }

    #[test]
    fn test_empty_mapping_is_all_virtual() {
        let reactor = reactor();
        let repo = StaticRepository::new();
        let catalog = Catalog::new(&reactor, &repo);

        let (graph, lookup) = build_metapackages(&catalog, &IndexMap::new());
        assert_eq!(graph.len(), 3);
        assert!(graph.ids().into_iter().all(|id| graph[id].is_virtual()));
        assert!(graph.ids().into_iter().all(|id| !graph[id].is_splittable()));
        assert_eq!(lookup.len(), 3);
    }

    #[test]
    fn test_groups_by_target_name() {
        let reactor = reactor();
        let repo = StaticRepository::new();
        let catalog = Catalog::new(&reactor, &repo);
        let r = catalog.reactor();

        let mut partial: IndexMap<String, IndexSet<UnitIdx>> = IndexMap::new();
        partial.entry("sub".into()).or_default().extend([r[0], r[2]]);

        let (graph, lookup) = build_metapackages(&catalog, &partial);
        assert_eq!(graph.len(), 2);
        assert_eq!(lookup[&r[0]], lookup[&r[2]]);
        assert!(graph[lookup[&r[0]]].has_name("sub"));
        assert!(graph[lookup[&r[1]]].is_virtual());
    }

    #[test]
    fn test_unit_assigned_twice_stays_with_first_name() {
        let reactor = reactor();
        let repo = StaticRepository::new();
        let catalog = Catalog::new(&reactor, &repo);
        let r = catalog.reactor();

        let mut partial: IndexMap<String, IndexSet<UnitIdx>> = IndexMap::new();
        partial.entry("one".into()).or_default().insert(r[0]);
        partial.entry("two".into()).or_default().extend([r[0], r[1]]);

        let (graph, lookup) = build_metapackages(&catalog, &partial);
        assert!(graph[lookup[&r[0]]].has_name("one"));
        assert_eq!(graph[lookup[&r[1]]].units().len(), 1);
    }
}
