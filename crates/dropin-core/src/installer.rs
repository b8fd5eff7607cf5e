//! End-to-end installation pipeline.

use crate::builder::build_metapackages;
use crate::catalog::{Catalog, UnitIdx};
use crate::consolidate::consolidate_cycles;
use crate::error::InstallError;
use crate::expand::expand_virtual_packages;
use crate::placement::{Placement, report};
use crate::repository::UnitRepository;
use crate::resolver::Resolver;
use crate::split::split_shared_references;
use dropin_schema::Unit;
use indexmap::{IndexMap, IndexSet};

/// Default directory dropins are rendered under.
pub const DEFAULT_DROPIN_DIR: &str = "dropins";

/// What to install and how to group it.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    /// Units being installed.
    pub reactor: Vec<Unit>,
    /// Unit id to package name. Every reactor unit with that id is mapped.
    pub mappings: IndexMap<String, String>,
    /// Package receiving everything nobody else claims.
    pub main_package: String,
    /// Unit ids whose optional requirements are ignored.
    pub ignore_optional: IndexSet<String>,
    /// Directory dropins are rendered under.
    pub dropin_dir: String,
}

impl InstallRequest {
    /// A request placing everything into `main_package` unless mapped otherwise.
    pub fn new(main_package: impl Into<String>, reactor: impl IntoIterator<Item = Unit>) -> Self {
        Self {
            reactor: reactor.into_iter().collect(),
            mappings: IndexMap::new(),
            main_package: main_package.into(),
            ignore_optional: IndexSet::new(),
            dropin_dir: DEFAULT_DROPIN_DIR.to_string(),
        }
    }

    /// Map units with id `unit_id` into `package`.
    pub fn map(mut self, unit_id: impl Into<String>, package: impl Into<String>) -> Self {
        self.mappings.insert(unit_id.into(), package.into());
        self
    }

    /// Ignore optional requirements of units with id `unit_id`.
    pub fn ignore_optional(mut self, unit_id: impl Into<String>) -> Self {
        self.ignore_optional.insert(unit_id.into());
        self
    }

    /// Render dropins under `dir`.
    pub fn dropin_dir(mut self, dir: impl Into<String>) -> Self {
        self.dropin_dir = dir.into();
        self
    }

    fn validate(&self) -> Result<(), InstallError> {
        if self.main_package.trim().is_empty() {
            return Err(InstallError::InvalidRequest(
                "main package name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs install requests against one repository.
#[derive(Debug, Clone, Copy)]
pub struct Installer<'r> {
    repository: &'r dyn UnitRepository,
}

impl<'r> Installer<'r> {
    /// Create an installer resolving against `repository`.
    pub fn new(repository: &'r dyn UnitRepository) -> Self {
        Self { repository }
    }

    /// Partition the request's reactor into dropins.
    ///
    /// Unresolvable requirements, ambiguous matches and cycles across named
    /// packages are logged and do not stop the run.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::InvalidRequest`] for an empty main package
    /// name and [`InstallError::UnmergedVirtualPackages`] when some units
    /// cannot be assigned to a single package.
    pub fn install(&self, request: &InstallRequest) -> Result<Placement, InstallError> {
        request.validate()?;

        let catalog = Catalog::new(&request.reactor, self.repository);
        catalog.dump();

        let partial = partial_mapping(&catalog, request);
        let (mut graph, mut lookup) = build_metapackages(&catalog, &partial);

        tracing::info!("Resolving dependencies of {} units", request.reactor.len());
        let resolution =
            Resolver::new(&catalog, &request.ignore_optional).resolve(&mut graph, &mut lookup);

        consolidate_cycles(&mut graph, &catalog);
        split_shared_references(&mut graph);
        expand_virtual_packages(&mut graph, &request.main_package, &catalog)?;

        Ok(report(
            &graph,
            &catalog,
            &resolution.requires,
            self.repository,
            &request.dropin_dir,
        ))
    }
}

/// Explicit mappings resolved to reactor units, grouped by package name.
fn partial_mapping(
    catalog: &Catalog<'_>,
    request: &InstallRequest,
) -> IndexMap<String, IndexSet<UnitIdx>> {
    let mut partial: IndexMap<String, IndexSet<UnitIdx>> = IndexMap::new();
    for (unit_id, package) in &request.mappings {
        if package.trim().is_empty() {
            tracing::warn!("Ignoring mapping of {} to an empty package name", unit_id);
            continue;
        }
        let units: Vec<UnitIdx> = catalog.reactor_with_id(unit_id).collect();
        if units.is_empty() {
            tracing::warn!("Ignoring mapping of {} to {}: no such unit is being installed", unit_id, package);
            continue;
        }
        partial.entry(package.clone()).or_default().extend(units);
    }
    partial
}
