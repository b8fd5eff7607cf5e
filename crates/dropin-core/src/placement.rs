//! Final placement of units into dropins.

use crate::REQUIRES_PROPERTY;
use crate::catalog::{Catalog, UnitIdx};
use crate::metapackage::{Contents, MetapackageGraph};
use crate::repository::UnitRepository;
use dropin_schema::{ArtifactKey, ArtifactKind};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// An artifact physically installed into a dropin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provide {
    /// Artifact id.
    pub id: String,
    /// Artifact version.
    pub version: String,
    /// Installed location.
    pub path: PathBuf,
    /// Extra metadata, `osgi.requires` among them.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, String>,
}

impl Provide {
    /// Comma-joined ids of the units this artifact needs outside its dropin.
    pub fn requires(&self) -> Option<&str> {
        self.properties.get(REQUIRES_PROPERTY).map(String::as_str)
    }
}

/// An artifact reachable from a dropin by reference only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymlinkRef {
    /// Artifact id.
    pub id: String,
    /// Artifact version.
    pub version: String,
    /// File name of the link inside the dropin.
    pub link_name: String,
    /// Where the link points, if the repository knows.
    pub target: Option<PathBuf>,
}

/// One output package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dropin {
    /// Package name.
    pub name: String,
    /// Root of the dropin.
    pub path: PathBuf,
    /// Physically installed artifacts.
    pub provides: Vec<Provide>,
    /// Referenced artifacts.
    pub symlinks: Vec<SymlinkRef>,
}

impl Dropin {
    /// Ids of every artifact placed into this dropin, provides first.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.provides
            .iter()
            .map(|p| p.id.as_str())
            .chain(self.symlinks.iter().map(|s| s.id.as_str()))
    }
}

/// Result of an installation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// Dropins in package order, then name order within merged packages.
    pub dropins: Vec<Dropin>,
}

impl Placement {
    /// The dropin called `name`.
    pub fn dropin(&self, name: &str) -> Option<&Dropin> {
        self.dropins.iter().find(|d| d.name == name)
    }

    /// Package name to the ids placed into it, physical and referenced.
    pub fn package_map(&self) -> IndexMap<String, Vec<String>> {
        self.dropins
            .iter()
            .map(|dropin| {
                let ids: IndexSet<&str> = dropin.ids().collect();
                (
                    dropin.name.clone(),
                    ids.into_iter().map(str::to_string).collect(),
                )
            })
            .collect()
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Fails only if serialization itself fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn install_path(dropin: &Path, artifact: &ArtifactKey) -> PathBuf {
    let dir = match artifact.kind {
        ArtifactKind::Bundle => "plugins",
        ArtifactKind::Feature => "features",
    };
    dropin.join("eclipse").join(dir).join(artifact.file_name())
}

/// Turn the expanded graph into dropins.
///
/// Reactor units become provides, carrying the ids they require from outside
/// their own dropin. Every other unit in a package is referenced by symlink.
pub fn report(
    graph: &MetapackageGraph,
    catalog: &Catalog<'_>,
    requires: &IndexMap<UnitIdx, IndexSet<UnitIdx>>,
    repository: &dyn UnitRepository,
    dropin_dir: &str,
) -> Placement {
    let root = Path::new("/").join(dropin_dir);
    let mut placement = Placement::default();

    for id in graph.ids() {
        let Contents::Physical(names) = graph[id].contents() else {
            tracing::debug!("Skipping virtual package {}", id);
            continue;
        };

        for (name, units) in names {
            let path = root.join(name);
            let (physical, linked): (Vec<UnitIdx>, Vec<UnitIdx>) =
                units.iter().copied().partition(|u| catalog.is_reactor(*u));
            let colocated: IndexSet<UnitIdx> = physical.iter().copied().collect();

            let mut provides = Vec::new();
            for unit_idx in &physical {
                let unit = catalog.unit(*unit_idx);
                let needed: IndexSet<&str> = requires
                    .get(unit_idx)
                    .into_iter()
                    .flatten()
                    .filter(|target| !colocated.contains(*target))
                    .map(|target| catalog.unit(*target).id())
                    .collect();

                let mut properties = IndexMap::new();
                if !needed.is_empty() {
                    let joined = needed.into_iter().collect::<Vec<_>>().join(",");
                    properties.insert(REQUIRES_PROPERTY.to_string(), joined);
                }

                for artifact in unit.artifacts() {
                    provides.push(Provide {
                        id: artifact.id.clone(),
                        version: artifact.version.to_string(),
                        path: install_path(&path, artifact),
                        properties: properties.clone(),
                    });
                }
            }

            let mut symlinks = Vec::new();
            for unit_idx in &linked {
                let unit = catalog.unit(*unit_idx);
                let target = repository.lookup_path(unit).map(Path::to_path_buf);
                if target.is_none() {
                    tracing::error!("No location known for {} referenced by {}", unit, name);
                }
                for artifact in unit.artifacts() {
                    symlinks.push(SymlinkRef {
                        id: artifact.id.clone(),
                        version: artifact.version.to_string(),
                        link_name: artifact.file_name(),
                        target: target.clone(),
                    });
                }
            }

            tracing::info!(
                "Dropin {}: {} provided, {} linked",
                name,
                provides.len(),
                symlinks.len()
            );
            placement.dropins.push(Dropin {
                name: name.clone(),
                path,
                provides,
                symlinks,
            });
        }
    }

    placement
}
