use crate::types::{Capability, Requirement, namespace};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an artifact is installed as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// A plugin, installed under `plugins/`.
    #[default]
    Bundle,
    /// A feature, installed under `features/`.
    Feature,
}

/// On-disk shape of an artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactShape {
    /// A single `.jar` file.
    #[default]
    Archive,
    /// An expanded directory.
    Directory,
}

/// One artifact produced by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactKey {
    /// Artifact id, usually the unit id.
    pub id: String,
    /// Artifact version, usually the unit version.
    pub version: Version,
    /// Bundle or feature.
    #[serde(default)]
    pub kind: ArtifactKind,
    /// Jar or directory.
    #[serde(default)]
    pub shape: ArtifactShape,
}

impl ArtifactKey {
    /// A jar-shaped bundle artifact.
    pub fn bundle(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
            kind: ArtifactKind::Bundle,
            shape: ArtifactShape::Archive,
        }
    }

    /// A feature artifact. Features are always installed expanded.
    pub fn feature(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
            kind: ArtifactKind::Feature,
            shape: ArtifactShape::Directory,
        }
    }

    /// `<id>_<version>` with `.jar` appended for archives.
    pub fn file_name(&self) -> String {
        match self.shape {
            ArtifactShape::Archive => format!("{}_{}.jar", self.id, self.version),
            ArtifactShape::Directory => format!("{}_{}", self.id, self.version),
        }
    }

    fn capability(&self) -> Capability {
        let ns = match self.kind {
            ArtifactKind::Bundle => namespace::BUNDLE,
            ArtifactKind::Feature => namespace::FEATURE,
        };
        Capability::new(ns, self.id.clone(), self.version.clone())
    }
}

/// An installable unit.
///
/// Built once and never mutated afterwards. The capability list always holds
/// the implicit identity and per-artifact capabilities followed by the
/// declared ones, which keeps [`Unit::capability_count`] meaningful for the
/// resolver's "narrowest provider" tie-break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    id: String,
    version: Version,
    artifacts: Vec<ArtifactKey>,
    provides: Vec<Capability>,
    requires: Vec<Requirement>,
    capabilities: Vec<Capability>,
}

impl Unit {
    /// Create a unit producing a single jar-shaped bundle with its own id and version.
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        let id = id.into();
        let mut unit = Self {
            artifacts: vec![ArtifactKey::bundle(id.clone(), version.clone())],
            id,
            version,
            provides: Vec::new(),
            requires: Vec::new(),
            capabilities: Vec::new(),
        };
        unit.reindex();
        unit
    }

    /// Create a feature unit producing one feature artifact.
    pub fn feature(id: impl Into<String>, version: Version) -> Self {
        let id = id.into();
        Self::new(id.clone(), version.clone()).with_artifacts([ArtifactKey::feature(id, version)])
    }

    /// Replace the produced artifacts. An empty iterator keeps the default artifact.
    pub fn with_artifacts(mut self, artifacts: impl IntoIterator<Item = ArtifactKey>) -> Self {
        let artifacts: Vec<ArtifactKey> = artifacts.into_iter().collect();
        if !artifacts.is_empty() {
            self.artifacts = artifacts;
            self.reindex();
        }
        self
    }

    /// Add a provided capability.
    pub fn provides(mut self, capability: Capability) -> Self {
        self.provides.push(capability);
        self.reindex();
        self
    }

    /// Add a requirement.
    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requires.push(requirement);
        self
    }

    /// Unit id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Unit version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Produced artifacts, never empty.
    pub fn artifacts(&self) -> &[ArtifactKey] {
        &self.artifacts
    }

    /// Declared requirements, including meta-requirements.
    pub fn requirements(&self) -> &[Requirement] {
        &self.requires
    }

    /// All provided capabilities, implicit ones first.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Number of provided capabilities.
    pub fn capability_count(&self) -> usize {
        self.capabilities.len()
    }

    /// Whether this unit attaches to a host.
    pub fn is_fragment(&self) -> bool {
        self.requires.iter().any(Requirement::is_meta)
    }

    /// The highest capability version satisfying `requirement`, if any.
    pub fn satisfies(&self, requirement: &Requirement) -> Option<&Version> {
        self.capabilities
            .iter()
            .filter(|c| requirement.matches(c))
            .map(|c| &c.version)
            .max()
    }

    /// Whether `other` has the same id and version.
    pub fn same_identity(&self, other: &Unit) -> bool {
        self.id == other.id && self.version == other.version
    }

    fn reindex(&mut self) {
        let mut capabilities = Vec::with_capacity(1 + self.artifacts.len() + self.provides.len());
        capabilities.push(Capability::new(
            namespace::UNIT,
            self.id.clone(),
            self.version.clone(),
        ));
        for artifact in &self.artifacts {
            let capability = artifact.capability();
            if !capabilities.contains(&capability) {
                capabilities.push(capability);
            }
        }
        capabilities.extend(self.provides.iter().cloned());
        self.capabilities = capabilities;
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionRange;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_default_artifact() {
        let unit = Unit::new("org.foo", v("1.2"));
        assert_eq!(unit.artifacts().len(), 1);
        assert_eq!(unit.artifacts()[0].file_name(), "org.foo_1.2.0.jar");
        // identity + bundle
        assert_eq!(unit.capability_count(), 2);
    }

    #[test]
    fn test_feature_unit() {
        let unit = Unit::feature("org.feat", v("1"));
        assert_eq!(unit.artifacts()[0].kind, ArtifactKind::Feature);
        assert_eq!(unit.artifacts()[0].file_name(), "org.feat_1.0.0");
        let req = Requirement::mandatory(namespace::FEATURE, "org.feat", VersionRange::Any);
        assert!(unit.satisfies(&req).is_some());
    }

    #[test]
    fn test_satisfies_picks_highest_matching_capability() {
        let unit = Unit::new("exporter", v("1"))
            .provides(Capability::new(namespace::PACKAGE, "p", v("2")))
            .provides(Capability::new(namespace::PACKAGE, "p", v("4")))
            .provides(Capability::new(namespace::PACKAGE, "p", v("6")));
        let req = Requirement::mandatory(
            namespace::PACKAGE,
            "p",
            VersionRange::parse("[2,5)").unwrap(),
        );
        assert_eq!(unit.satisfies(&req), Some(&v("4")));
        assert_eq!(unit.capability_count(), 5);
    }

    #[test]
    fn test_fragment_detection() {
        let plain = Unit::new("a", v("1"));
        let fragment = Unit::new("b", v("1")).requires(Requirement::host("a", VersionRange::Any));
        assert!(!plain.is_fragment());
        assert!(fragment.is_fragment());
    }
}
