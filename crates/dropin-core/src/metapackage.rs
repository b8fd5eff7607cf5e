//! Metapackage arena.
//!
//! A metapackage is a group of units destined for one output location. It is
//! either *physical* (one or more explicit names, each with its units) or
//! *virtual* (units not placed yet). Packages live in an arena indexed by
//! [`PackageId`]; forward and reverse edges are index sets kept symmetric by
//! every mutation. Merged-away packages are tombstoned, never removed, so ids
//! stay valid for the whole run.

use crate::catalog::{Catalog, UnitIdx};
use indexmap::{IndexMap, IndexSet};
use std::fmt::{self, Write as _};
use std::ops::{Index, IndexMut};

/// Index of a metapackage in a [`MetapackageGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(u32);

impl PackageId {
    /// Slot position in the arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// What a metapackage holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    /// Named output packages. After cycle consolidation one metapackage can
    /// carry several names; each keeps its own units.
    Physical(IndexMap<String, IndexSet<UnitIdx>>),
    /// Units awaiting a package name.
    Virtual {
        /// Unplaced units. A single one until cycles get merged.
        units: IndexSet<UnitIdx>,
        /// Whether the package stands for an external reference and may be
        /// cloned per dependent.
        splittable: bool,
    },
}

impl Default for Contents {
    fn default() -> Self {
        Self::Virtual {
            units: IndexSet::new(),
            splittable: false,
        }
    }
}

impl Contents {
    /// Combine the contents of a surviving package with an absorbed one.
    fn merge(self, absorbed: Contents) -> Contents {
        match (self, absorbed) {
            (Self::Physical(mut names), Self::Physical(other)) => {
                for (name, units) in other {
                    names.entry(name).or_default().extend(units);
                }
                Self::Physical(names)
            }
            (Self::Physical(mut names), Self::Virtual { units, .. })
            | (Self::Virtual { units, .. }, Self::Physical(mut names)) => {
                if let Some((_, first)) = names.first_mut() {
                    first.extend(units);
                }
                Self::Physical(names)
            }
            (
                Self::Virtual {
                    mut units,
                    splittable,
                },
                Self::Virtual {
                    units: other,
                    splittable: other_splittable,
                },
            ) => {
                units.extend(other);
                Self::Virtual {
                    units,
                    splittable: splittable && other_splittable,
                }
            }
        }
    }
}

/// One node of the package graph.
#[derive(Debug, Clone)]
pub struct Metapackage {
    contents: Contents,
    deps: IndexSet<PackageId>,
    revdeps: IndexSet<PackageId>,
}

impl Metapackage {
    fn new(contents: Contents) -> Self {
        Self {
            contents,
            deps: IndexSet::new(),
            revdeps: IndexSet::new(),
        }
    }

    /// Physical or virtual contents.
    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    /// Packages this one depends on.
    pub fn deps(&self) -> &IndexSet<PackageId> {
        &self.deps
    }

    /// Packages depending on this one.
    pub fn revdeps(&self) -> &IndexSet<PackageId> {
        &self.revdeps
    }

    /// Whether no name has been assigned yet.
    pub fn is_virtual(&self) -> bool {
        matches!(self.contents, Contents::Virtual { .. })
    }

    /// Whether this is a virtual package that may be cloned per dependent.
    pub fn is_splittable(&self) -> bool {
        matches!(
            self.contents,
            Contents::Virtual {
                splittable: true,
                ..
            }
        )
    }

    /// Whether `name` is one of this package's physical names.
    pub fn has_name(&self, name: &str) -> bool {
        matches!(&self.contents, Contents::Physical(names) if names.contains_key(name))
    }

    /// Physical names, empty for virtual packages.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let names = match &self.contents {
            Contents::Physical(names) => Some(names.keys().map(String::as_str)),
            Contents::Virtual { .. } => None,
        };
        names.into_iter().flatten()
    }

    /// Every unit, across all names.
    pub fn units(&self) -> IndexSet<UnitIdx> {
        match &self.contents {
            Contents::Physical(names) => names.values().flatten().copied().collect(),
            Contents::Virtual { units, .. } => units.clone(),
        }
    }
}

/// Arena of metapackages with tombstones.
#[derive(Debug, Clone, Default)]
pub struct MetapackageGraph {
    slots: Vec<Option<Metapackage>>,
}

impl MetapackageGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, package: Metapackage) -> PackageId {
        let id = PackageId(self.slots.len() as u32);
        self.slots.push(Some(package));
        id
    }

    /// Add a physical package named `name`.
    pub fn add_physical(
        &mut self,
        name: impl Into<String>,
        units: impl IntoIterator<Item = UnitIdx>,
    ) -> PackageId {
        let mut names = IndexMap::new();
        names.insert(name.into(), units.into_iter().collect());
        self.push(Metapackage::new(Contents::Physical(names)))
    }

    /// Add a virtual package holding a single unit.
    pub fn add_virtual(&mut self, unit: UnitIdx, splittable: bool) -> PackageId {
        let mut units = IndexSet::new();
        units.insert(unit);
        self.push(Metapackage::new(Contents::Virtual { units, splittable }))
    }

    /// Number of arena slots ever allocated, tombstones included.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live packages.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether no live package remains.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` has not been merged away.
    pub fn is_live(&self, id: PackageId) -> bool {
        self.get(id).is_some()
    }

    /// The package at `id`, unless it was merged away.
    pub fn get(&self, id: PackageId) -> Option<&Metapackage> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Live package ids in creation order.
    pub fn ids(&self) -> Vec<PackageId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| PackageId(i as u32))
            .collect()
    }

    /// Record that `from` depends on `to`. Self-edges are ignored.
    pub fn add_dependency(&mut self, from: PackageId, to: PackageId) {
        if from == to {
            return;
        }
        self[from].deps.insert(to);
        self[to].revdeps.insert(from);
    }

    /// Fold `absorbed` into `survivor` and tombstone `absorbed`.
    ///
    /// Contents are combined per [`Contents`] variant pair, every edge that
    /// referenced `absorbed` is redirected to `survivor` and any resulting
    /// self-edge is dropped.
    pub fn merge(&mut self, survivor: PackageId, absorbed: PackageId) {
        if survivor == absorbed || !self.is_live(survivor) {
            return;
        }
        let Some(gone) = self.slots[absorbed.index()].take() else {
            return;
        };

        for dep in &gone.deps {
            let node = &mut self[*dep];
            node.revdeps.shift_remove(&absorbed);
            node.revdeps.insert(survivor);
        }
        for rev in &gone.revdeps {
            let node = &mut self[*rev];
            node.deps.shift_remove(&absorbed);
            node.deps.insert(survivor);
        }

        let node = &mut self[survivor];
        let contents = std::mem::take(&mut node.contents);
        node.contents = contents.merge(gone.contents);
        node.deps.extend(gone.deps);
        node.revdeps.extend(gone.revdeps);
        node.deps.shift_remove(&survivor);
        node.revdeps.shift_remove(&survivor);
    }

    /// Turn a virtual package into the physical package `name`.
    pub fn promote(&mut self, id: PackageId, name: &str) {
        let node = &mut self[id];
        if let Contents::Virtual { units, .. } = std::mem::take(&mut node.contents) {
            let mut names = IndexMap::new();
            names.insert(name.to_string(), units);
            node.contents = Contents::Physical(names);
        }
    }

    /// Peel the most recent reverse dependency of a virtual package off into
    /// a fresh splittable clone with the same units and forward dependencies.
    ///
    /// Returns `None` if `id` is physical or has fewer than two dependents.
    pub fn split(&mut self, id: PackageId) -> Option<PackageId> {
        let node = &self[id];
        if node.revdeps.len() < 2 {
            return None;
        }
        let Contents::Virtual { units, .. } = &node.contents else {
            return None;
        };
        let units = units.clone();
        let deps = node.deps.clone();

        let node = &mut self[id];
        let owner = node.revdeps.pop()?;

        let mut clone = Metapackage::new(Contents::Virtual {
            units,
            splittable: true,
        });
        clone.revdeps.insert(owner);
        clone.deps = deps;
        let clone_id = self.push(clone);

        let owner_node = &mut self[owner];
        owner_node.deps.shift_remove(&id);
        owner_node.deps.insert(clone_id);
        for dep in self[clone_id].deps.clone() {
            self[dep].revdeps.insert(clone_id);
        }

        Some(clone_id)
    }

    /// Render one package's contents for diagnostics.
    pub fn describe(&self, id: PackageId, catalog: &Catalog<'_>) -> String {
        let mut out = String::new();
        let Some(node) = self.get(id) else {
            return out;
        };
        match &node.contents {
            Contents::Physical(names) => {
                for (name, units) in names {
                    let _ = writeln!(out, "  Physical package {name}:");
                    for unit in units {
                        let _ = writeln!(out, "    * {}", catalog.unit(*unit));
                    }
                }
            }
            Contents::Virtual { units, .. } => {
                let _ = writeln!(out, "  Virtual package:");
                for unit in units {
                    let _ = writeln!(out, "    * {}", catalog.unit(*unit));
                }
            }
        }
        out
    }

    /// Render a package followed by every package depending on it.
    pub fn dump(&self, id: PackageId, catalog: &Catalog<'_>) -> String {
        let mut out = self.describe(id, catalog);
        out.push_str("  Required by:\n");
        if let Some(node) = self.get(id) {
            for rev in &node.revdeps {
                out.push_str(&self.describe(*rev, catalog));
            }
        }
        out.push_str("===================================\n");
        out
    }
}

impl Index<PackageId> for MetapackageGraph {
    type Output = Metapackage;

    /// # Panics
    ///
    /// Panics if `id` was merged away.
    fn index(&self, id: PackageId) -> &Self::Output {
        match self.get(id) {
            Some(node) => node,
            None => panic!("metapackage {id} was merged away"),
        }
    }
}

impl IndexMut<PackageId> for MetapackageGraph {
    fn index_mut(&mut self, id: PackageId) -> &mut Self::Output {
        match self.slots.get_mut(id.index()).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("metapackage {id} was merged away"),
        }
    }
}
