//! Install plan files.
//!
//! A plan is a TOML document describing one install request together with
//! the repository tiers it resolves against:
//!
//! ```toml
//! [request]
//! main = "eclipse-foo"
//! ignore_optional = ["org.foo.tests"]
//!
//! [request.mappings]
//! "org.foo.extras" = "eclipse-foo-extras"
//!
//! [[reactor]]
//! id = "org.foo.core"
//! version = "1.2.0"
//! provides = ["java.package:org.foo.api@1.2.0"]
//! requires = ["org.bar", "java.package:org.baz@[1.0,2.0)?"]
//!
//! [[external]]
//! id = "org.bar"
//! version = "3.0.0"
//! path = "/usr/share/java/bar.jar"
//! ```

use crate::installer::{DEFAULT_DROPIN_DIR, InstallRequest};
use crate::repository::StaticRepository;
use anyhow::{Context, Result};
use dropin_schema::{ArtifactKey, ArtifactKind, Capability, Requirement, Unit, Version};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The `[request]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSection {
    /// Main package name.
    pub main: String,
    /// Directory dropins are rendered under.
    #[serde(default = "default_dropin_dir")]
    pub dropin_dir: String,
    /// Unit ids whose optional requirements are ignored.
    #[serde(default)]
    pub ignore_optional: Vec<String>,
    /// Unit id to package name.
    #[serde(default)]
    pub mappings: IndexMap<String, String>,
}

fn default_dropin_dir() -> String {
    DEFAULT_DROPIN_DIR.to_string()
}

/// A unit table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitSpec {
    /// Unit id.
    pub id: String,
    /// Unit version.
    pub version: Version,
    /// Bundle (default) or feature.
    #[serde(default)]
    pub kind: ArtifactKind,
    /// Declared capabilities, `namespace:name[@version]`.
    #[serde(default)]
    pub provides: Vec<String>,
    /// Requirements, `[namespace:]name[@range][?|!]` or `host:name[@range]`.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Produced artifacts. Defaults to one artifact named after the unit.
    #[serde(default)]
    pub artifacts: Vec<ArtifactKey>,
    /// On-disk location, for units outside the reactor.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl UnitSpec {
    /// Build the unit.
    ///
    /// # Errors
    ///
    /// Returns an error naming the unit if a capability or requirement does
    /// not parse.
    pub fn to_unit(&self) -> Result<Unit> {
        let mut unit = match self.kind {
            ArtifactKind::Bundle => Unit::new(self.id.clone(), self.version.clone()),
            ArtifactKind::Feature => Unit::feature(self.id.clone(), self.version.clone()),
        }
        .with_artifacts(self.artifacts.iter().cloned());

        for capability in &self.provides {
            let capability = Capability::parse(capability)
                .with_context(|| format!("Invalid capability '{}' of unit {}", capability, self.id))?;
            unit = unit.provides(capability);
        }
        for requirement in &self.requires {
            let requirement = Requirement::parse(requirement)
                .with_context(|| format!("Invalid requirement '{}' of unit {}", requirement, self.id))?;
            unit = unit.requires(requirement);
        }
        Ok(unit)
    }
}

/// A parsed install plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallPlan {
    /// Request parameters.
    pub request: RequestSection,
    /// Units being installed.
    #[serde(default)]
    pub reactor: Vec<UnitSpec>,
    /// Platform tier.
    #[serde(default)]
    pub platform: Vec<UnitSpec>,
    /// Internal tier.
    #[serde(default)]
    pub internal: Vec<UnitSpec>,
    /// External tier.
    #[serde(default)]
    pub external: Vec<UnitSpec>,
    /// Runtime tier.
    #[serde(default)]
    pub meta: Vec<UnitSpec>,
}

impl InstallPlan {
    /// Load a plan from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid plan.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse a plan from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid plan.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Total number of units across all tables.
    pub fn unit_count(&self) -> usize {
        self.reactor.len()
            + self.platform.len()
            + self.internal.len()
            + self.external.len()
            + self.meta.len()
    }

    /// Split the plan into the request and the repository it runs against.
    ///
    /// # Errors
    ///
    /// Returns an error if any unit's capabilities or requirements do not
    /// parse.
    pub fn into_parts(self) -> Result<(InstallRequest, StaticRepository)> {
        let reactor = build_units(&self.reactor)?
            .into_iter()
            .map(|(unit, _)| unit)
            .collect::<Vec<_>>();

        let platform = build_units(&self.platform)?;
        let internal = build_units(&self.internal)?;
        let external = build_units(&self.external)?;
        let meta = build_units(&self.meta)?;

        let mut repository = StaticRepository::new();
        for (unit, path) in platform.iter().chain(&internal).chain(&external).chain(&meta) {
            if let Some(path) = path {
                repository = repository.with_path(unit, path.clone());
            }
        }
        let units = |built: Vec<(Unit, Option<PathBuf>)>| built.into_iter().map(|(unit, _)| unit);
        let repository = repository
            .with_platform(units(platform))
            .with_internal(units(internal))
            .with_external(units(external))
            .with_meta(units(meta));

        let request = InstallRequest {
            reactor,
            mappings: self.request.mappings,
            main_package: self.request.main,
            ignore_optional: self.request.ignore_optional.into_iter().collect::<IndexSet<_>>(),
            dropin_dir: self.request.dropin_dir,
        };
        Ok((request, repository))
    }
}

fn build_units(specs: &[UnitSpec]) -> Result<Vec<(Unit, Option<PathBuf>)>> {
    specs
        .iter()
        .map(|spec| Ok((spec.to_unit()?, spec.path.clone())))
        .collect()
}
