//! Flat index over every unit taking part in one installation.
//!
//! The resolver and the metapackage graph refer to units by [`UnitIdx`] only;
//! the catalog maps an index back to the unit and the tier it came from.

use crate::repository::{Tier, UnitRepository};
use dropin_schema::{Requirement, Unit, Version};
use std::collections::HashSet;
use std::fmt;

/// Index of a unit inside a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitIdx(u32);

impl UnitIdx {
    /// Position in the catalog.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Entry<'a> {
    unit: &'a Unit,
    tier: Tier,
}

/// All units of an installation, tagged with their tier.
///
/// A unit whose id and version already appear in an earlier tier is
/// shadowed: the reactor wins over the platform, the platform over internal
/// units and so on. Reactor units sharing an id and version are all kept
/// unless they also produce the same artifacts.
#[derive(Debug)]
pub struct Catalog<'a> {
    entries: Vec<Entry<'a>>,
    tiers: [Vec<UnitIdx>; Tier::COUNT],
}

impl<'a> Catalog<'a> {
    /// Index the reactor and every tier of `repository`.
    pub fn new(reactor: &'a [Unit], repository: &'a dyn UnitRepository) -> Self {
        let mut catalog = Self {
            entries: Vec::new(),
            tiers: Default::default(),
        };
        let mut seen: HashSet<(&'a str, &'a Version)> = HashSet::new();

        for tier in Tier::ALL {
            let units = match tier {
                Tier::Reactor => reactor,
                _ => repository.units(tier),
            };
            for unit in units {
                if tier == Tier::Reactor {
                    if let Some(clash) = catalog.reactor_clash(unit) {
                        tracing::warn!(
                            "Ignoring duplicate reactor unit {} (same artifacts as {})",
                            unit,
                            catalog.unit(clash)
                        );
                        continue;
                    }
                    seen.insert((unit.id(), unit.version()));
                } else if !seen.insert((unit.id(), unit.version())) {
                    tracing::debug!("Ignoring {} in {} tier (already known)", unit, tier);
                    continue;
                }
                let idx = UnitIdx(catalog.entries.len() as u32);
                catalog.entries.push(Entry { unit, tier });
                catalog.tiers[tier.index()].push(idx);
            }
        }

        catalog
    }

    /// An already indexed reactor unit with the same identity and the same
    /// artifacts as `unit`.
    fn reactor_clash(&self, unit: &Unit) -> Option<UnitIdx> {
        self.reactor().iter().copied().find(|idx| {
            let known = self.unit(*idx);
            known.same_identity(unit) && known.artifacts() == unit.artifacts()
        })
    }

    /// The unit at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` was not produced by this catalog.
    pub fn unit(&self, idx: UnitIdx) -> &'a Unit {
        self.entries[idx.index()].unit
    }

    /// The tier `idx` was indexed from.
    ///
    /// # Panics
    ///
    /// Panics if `idx` was not produced by this catalog.
    pub fn tier(&self, idx: UnitIdx) -> Tier {
        self.entries[idx.index()].tier
    }

    /// Whether `idx` is being installed by this request.
    pub fn is_reactor(&self, idx: UnitIdx) -> bool {
        self.tier(idx) == Tier::Reactor
    }

    /// Units of `tier` in indexing order.
    pub fn units_in(&self, tier: Tier) -> &[UnitIdx] {
        &self.tiers[tier.index()]
    }

    /// Reactor units in request order.
    pub fn reactor(&self) -> &[UnitIdx] {
        self.units_in(Tier::Reactor)
    }

    /// Reactor units carrying `id`.
    pub fn reactor_with_id<'s>(&'s self, id: &'s str) -> impl Iterator<Item = UnitIdx> + 's {
        self.reactor()
            .iter()
            .copied()
            .filter(move |idx| self.unit(*idx).id() == id)
    }

    /// Units of `tier` satisfying `requirement`, each with the best matching
    /// capability version.
    pub fn candidates(&self, tier: Tier, requirement: &Requirement) -> Vec<(UnitIdx, &'a Version)> {
        self.units_in(tier)
            .iter()
            .filter_map(|idx| {
                self.unit(*idx)
                    .satisfies(requirement)
                    .map(|version| (*idx, version))
            })
            .collect()
    }

    /// Log the content of every tier, sorted, at debug level.
    pub fn dump(&self) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        for tier in Tier::ALL {
            tracing::debug!("{} units:", tier);
            let mut sorted: Vec<String> = self
                .units_in(tier)
                .iter()
                .map(|idx| self.unit(*idx).to_string())
                .collect();
            sorted.sort();
            for unit in &sorted {
                tracing::debug!("  * {}", unit);
            }
            if sorted.is_empty() {
                tracing::debug!("  (none)");
            }
        }
    }
}
