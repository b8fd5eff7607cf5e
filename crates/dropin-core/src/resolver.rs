//! Requirement resolution against the tiers.
//!
//! Every unit of every metapackage (including external references discovered
//! on the way) has its requirements matched tier by tier; the first tier with
//! a match wins. What a match produces is data, described by
//! [`RESOLUTION_ORDER`], not control flow.

use crate::builder::PackageLookup;
use crate::catalog::{Catalog, UnitIdx};
use crate::metapackage::{MetapackageGraph, PackageId};
use crate::repository::Tier;
use dropin_schema::{Requirement, Unit, Version};
use indexmap::{IndexMap, IndexSet};
use std::cmp::Ordering;
use std::collections::VecDeque;

/// Which package edge a match in a tier produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePolicy {
    /// No edge.
    None,
    /// Edge to the match's existing package, only when the requiring unit is
    /// itself part of the reactor.
    Tracked,
    /// Edge to a splittable virtual package standing for the match, created
    /// on first use. Structural requirements never produce one.
    Reference,
}

/// How matches in one tier are treated.
#[derive(Debug, Clone, Copy)]
pub struct TierPolicy {
    /// Tier searched.
    pub tier: Tier,
    /// Package edge produced by a match.
    pub edge: EdgePolicy,
    /// Whether the match is recorded in the requiring unit's `requires` list.
    pub records_requires: bool,
}

/// Tiers in the order they are searched.
pub const RESOLUTION_ORDER: [TierPolicy; Tier::COUNT] = [
    TierPolicy {
        tier: Tier::Reactor,
        edge: EdgePolicy::Tracked,
        records_requires: true,
    },
    TierPolicy {
        tier: Tier::Platform,
        edge: EdgePolicy::None,
        records_requires: false,
    },
    TierPolicy {
        tier: Tier::Internal,
        edge: EdgePolicy::None,
        records_requires: true,
    },
    TierPolicy {
        tier: Tier::External,
        edge: EdgePolicy::Reference,
        records_requires: true,
    },
    TierPolicy {
        tier: Tier::Meta,
        edge: EdgePolicy::None,
        records_requires: false,
    },
];

/// Outcome of [`Resolver::resolve`].
#[derive(Debug, Default, Clone)]
pub struct Resolution {
    /// Resolved requirement targets per processed unit, in requirement order.
    pub requires: IndexMap<UnitIdx, IndexSet<UnitIdx>>,
    /// Requirements left unresolved (optional ones included).
    pub unresolved: usize,
    /// Requirements that had more than one candidate in the winning tier.
    pub ambiguous: usize,
}

/// Resolves requirements and grows the metapackage graph.
#[derive(Debug)]
pub struct Resolver<'c, 'a> {
    catalog: &'c Catalog<'a>,
    ignore_optional: &'c IndexSet<String>,
    chosen: IndexSet<UnitIdx>,
    resolution: Resolution,
}

impl<'c, 'a> Resolver<'c, 'a> {
    /// Create a resolver. Optional requirements of units whose id is in
    /// `ignore_optional` are dropped before matching.
    pub fn new(catalog: &'c Catalog<'a>, ignore_optional: &'c IndexSet<String>) -> Self {
        Self {
            catalog,
            ignore_optional,
            chosen: IndexSet::new(),
            resolution: Resolution::default(),
        }
    }

    /// Resolve every unit of every package in `graph`.
    ///
    /// Packages created for external references are queued and processed in
    /// turn, so their own requirements are followed too. Unresolved
    /// requirements are logged and skipped; resolution never fails.
    pub fn resolve(mut self, graph: &mut MetapackageGraph, lookup: &mut PackageLookup) -> Resolution {
        let mut queue: VecDeque<PackageId> = graph.ids().into();

        while let Some(package) = queue.pop_front() {
            for unit_idx in graph[package].units() {
                let unit = self.catalog.unit(unit_idx);
                tracing::debug!("##### Unit {}", unit);

                let mut requires = IndexSet::new();
                let skip_optional = self.ignore_optional.contains(unit.id());
                for requirement in active_requirements(unit, skip_optional) {
                    tracing::debug!("    Requires: {}", requirement);

                    let Some((policy, target)) = self.resolve_requirement(unit_idx, requirement)
                    else {
                        self.resolution.unresolved += 1;
                        if requirement.is_optional() {
                            tracing::info!(
                                "Unable to satisfy optional dependency from {} to {}",
                                unit,
                                requirement
                            );
                        } else {
                            tracing::warn!(
                                "Unable to satisfy dependency from {} to {}",
                                unit,
                                requirement
                            );
                        }
                        continue;
                    };
                    tracing::debug!(
                        "      => {} ({})",
                        self.catalog.unit(target),
                        policy.tier.label()
                    );

                    if policy.records_requires && !requirement.is_meta() {
                        requires.insert(target);
                    }

                    match policy.edge {
                        EdgePolicy::None => {}
                        EdgePolicy::Tracked => {
                            if self.catalog.is_reactor(unit_idx) {
                                if let Some(&dep) = lookup.get(&target) {
                                    graph.add_dependency(package, dep);
                                }
                            }
                        }
                        EdgePolicy::Reference => {
                            if requirement.is_meta() {
                                continue;
                            }
                            let dep = *lookup.entry(target).or_insert_with(|| {
                                let id = graph.add_virtual(target, true);
                                queue.push_back(id);
                                id
                            });
                            graph.add_dependency(package, dep);
                        }
                    }
                }

                self.resolution.requires.insert(unit_idx, requires);
            }
        }

        tracing::info!(
            "Resolved {} units ({} unresolved, {} ambiguous requirements)",
            self.resolution.requires.len(),
            self.resolution.unresolved,
            self.resolution.ambiguous
        );
        self.resolution
    }

    fn resolve_requirement(
        &mut self,
        requirer: UnitIdx,
        requirement: &Requirement,
    ) -> Option<(&'static TierPolicy, UnitIdx)> {
        for policy in &RESOLUTION_ORDER {
            let candidates = self.catalog.candidates(policy.tier, requirement);
            if candidates.is_empty() {
                continue;
            }

            if candidates.len() > 1 {
                self.resolution.ambiguous += 1;
                tracing::warn!(
                    "More than one {} unit satisfies dependency from {} to {}",
                    policy.tier,
                    self.catalog.unit(requirer),
                    requirement
                );
            }
            let target = self.choose(&candidates)?;

            self.chosen.insert(target);
            return Some((policy, target));
        }
        None
    }

    /// Pick one candidate: a unit already chosen earlier in this run if any,
    /// otherwise the best ranked one.
    fn choose(&self, candidates: &[(UnitIdx, &Version)]) -> Option<UnitIdx> {
        let rank = |a: &&(UnitIdx, &Version), b: &&(UnitIdx, &Version)| self.rank(**a, **b);
        candidates
            .iter()
            .filter(|(idx, _)| self.chosen.contains(idx))
            .min_by(rank)
            .or_else(|| candidates.iter().min_by(rank))
            .map(|(idx, _)| *idx)
    }

    /// Highest matched version first, then highest unit version, then fewest
    /// capabilities, then catalog order.
    fn rank(&self, (a, a_matched): (UnitIdx, &Version), (b, b_matched): (UnitIdx, &Version)) -> Ordering {
        let (ua, ub) = (self.catalog.unit(a), self.catalog.unit(b));
        b_matched
            .cmp(a_matched)
            .then_with(|| ub.version().cmp(ua.version()))
            .then_with(|| ua.capability_count().cmp(&ub.capability_count()))
            .then_with(|| a.cmp(&b))
    }
}

/// Requirements taking part in resolution: excluded ones are dropped, and
/// optional ones too when `skip_optional` is set.
fn active_requirements(unit: &Unit, skip_optional: bool) -> impl Iterator<Item = &Requirement> {
    unit.requirements()
        .iter()
        .filter(move |r| !r.is_excluded() && !(skip_optional && r.is_optional()))
}
