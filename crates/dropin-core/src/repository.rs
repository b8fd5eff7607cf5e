//! Tiered view of the units known to an installation.
//!
//! The reactor (units being installed now) comes from the request; the other
//! tiers describe what already exists on the target system. Resolution walks
//! the tiers in [`Tier::ALL`] order and stops at the first one that matches.

use dropin_schema::{Unit, Version};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A partition of known units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Units being installed by this request.
    Reactor,
    /// The trusted baseline installation. Always assumed present.
    Platform,
    /// Units discovered alongside the platform (other dropins).
    Internal,
    /// Everything else on the system; referenced by symlink.
    External,
    /// Synthetic capabilities of the hosting runtime itself.
    Meta,
}

impl Tier {
    /// Number of tiers.
    pub const COUNT: usize = 5;

    /// Resolution order.
    pub const ALL: [Tier; Tier::COUNT] = [
        Tier::Reactor,
        Tier::Platform,
        Tier::Internal,
        Tier::External,
        Tier::Meta,
    ];

    /// Position in [`Tier::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short description used in resolution traces.
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Reactor => "reactor",
            Tier::Platform => "part of platform",
            Tier::Internal => "dropins",
            Tier::External => "external, will be symlinked",
            Tier::Meta => "runtime",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Reactor => "reactor",
            Tier::Platform => "platform",
            Tier::Internal => "internal",
            Tier::External => "external",
            Tier::Meta => "meta",
        };
        f.write_str(name)
    }
}

/// Read-only access to the system tiers.
///
/// Implementations must return units in a stable order: it feeds directly
/// into tie-breaking and therefore into the reproducibility of the output.
pub trait UnitRepository: fmt::Debug {
    /// Units of the platform installation.
    fn platform_units(&self) -> &[Unit];

    /// Units co-discovered with the platform.
    fn internal_units(&self) -> &[Unit];

    /// Units available on the system but outside the platform.
    fn external_units(&self) -> &[Unit];

    /// Synthetic units describing the runtime. None by default.
    fn meta_units(&self) -> &[Unit] {
        &[]
    }

    /// On-disk location of an internal or external unit.
    fn lookup_path(&self, unit: &Unit) -> Option<&Path>;

    /// Units of `tier`. The reactor is not part of a repository.
    fn units(&self, tier: Tier) -> &[Unit] {
        match tier {
            Tier::Reactor => &[],
            Tier::Platform => self.platform_units(),
            Tier::Internal => self.internal_units(),
            Tier::External => self.external_units(),
            Tier::Meta => self.meta_units(),
        }
    }
}

/// In-memory [`UnitRepository`].
#[derive(Debug, Clone, Default)]
pub struct StaticRepository {
    platform: Vec<Unit>,
    internal: Vec<Unit>,
    external: Vec<Unit>,
    meta: Vec<Unit>,
    paths: HashMap<(String, Version), PathBuf>,
}

impl StaticRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add platform units.
    pub fn with_platform(mut self, units: impl IntoIterator<Item = Unit>) -> Self {
        self.platform.extend(units);
        self
    }

    /// Add internal units.
    pub fn with_internal(mut self, units: impl IntoIterator<Item = Unit>) -> Self {
        self.internal.extend(units);
        self
    }

    /// Add external units.
    pub fn with_external(mut self, units: impl IntoIterator<Item = Unit>) -> Self {
        self.external.extend(units);
        self
    }

    /// Add runtime units.
    pub fn with_meta(mut self, units: impl IntoIterator<Item = Unit>) -> Self {
        self.meta.extend(units);
        self
    }

    /// Record where a unit lives on disk.
    pub fn with_path(mut self, unit: &Unit, path: impl Into<PathBuf>) -> Self {
        self.paths
            .insert((unit.id().to_string(), unit.version().clone()), path.into());
        self
    }
}

impl UnitRepository for StaticRepository {
    fn platform_units(&self) -> &[Unit] {
        &self.platform
    }

    fn internal_units(&self) -> &[Unit] {
        &self.internal
    }

    fn external_units(&self) -> &[Unit] {
        &self.external
    }

    fn meta_units(&self) -> &[Unit] {
        &self.meta
    }

    fn lookup_path(&self, unit: &Unit) -> Option<&Path> {
        self.paths
            .get(&(unit.id().to_string(), unit.version().clone()))
            .map(PathBuf::as_path)
    }
}
