use crate::error::SchemaError;
use crate::version::{Version, VersionRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Well-known capability namespaces.
pub mod namespace {
    /// Identity of the unit itself. Every unit provides exactly one.
    pub const UNIT: &str = "unit";
    /// A bundle artifact (`Require-Bundle`, fragment hosts).
    pub const BUNDLE: &str = "osgi.bundle";
    /// A feature artifact.
    pub const FEATURE: &str = "org.eclipse.update.feature";
    /// An exported Java package (`Import-Package`).
    pub const PACKAGE: &str = "java.package";
}

/// Something a unit offers to satisfy requirements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Capability {
    /// Namespace such as [`namespace::PACKAGE`].
    pub namespace: String,
    /// Name within the namespace.
    pub name: String,
    /// Provided version.
    pub version: Version,
}

impl Capability {
    /// Create a capability.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, version: Version) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version,
        }
    }

    /// Parse `namespace:name[@version]`. A missing version means `0.0.0`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidCapability`] if the namespace or name is
    /// missing, or a version error if the version does not parse.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let input = s.trim();
        let invalid = || SchemaError::InvalidCapability(input.to_string());

        let (head, version) = match input.split_once('@') {
            Some((head, version)) => (head, Version::parse(version)?),
            None => (input, Version::ZERO),
        };
        let (namespace, name) = head.split_once(':').ok_or_else(invalid)?;
        if namespace.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(namespace, name, version))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.namespace, self.name, self.version)
    }
}

impl FromStr for Capability {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Capability {
    type Error = SchemaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Capability> for String {
    fn from(c: Capability) -> Self {
        c.to_string()
    }
}

/// Whether a requirement is an ordinary dependency or a structural one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementKind {
    /// An ordinary dependency (`Require-Bundle`, `Import-Package`, feature includes).
    #[default]
    Plain,
    /// A structural requirement such as "I am a fragment of host H". Resolved
    /// like any other requirement but never turned into an external reference.
    Meta,
}

/// A dependency declared by a unit.
///
/// The match predicate is namespace + name + range; `min`/`max` carry the
/// cardinality. `min == 0` is optional, `max == 0` is excluded (dropped before
/// resolution).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Requirement {
    /// Capability namespace to match.
    pub namespace: String,
    /// Capability name to match.
    pub name: String,
    /// Accepted versions.
    pub range: VersionRange,
    /// Minimum cardinality.
    pub min: u32,
    /// Maximum cardinality.
    pub max: u32,
    /// Plain or structural.
    pub kind: RequirementKind,
}

impl Requirement {
    fn with_cardinality(
        namespace: impl Into<String>,
        name: impl Into<String>,
        range: VersionRange,
        min: u32,
        max: u32,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            range,
            min,
            max,
            kind: RequirementKind::Plain,
        }
    }

    /// A requirement that must be satisfied (`min = 1`).
    pub fn mandatory(
        namespace: impl Into<String>,
        name: impl Into<String>,
        range: VersionRange,
    ) -> Self {
        Self::with_cardinality(namespace, name, range, 1, 1)
    }

    /// A requirement that may stay unsatisfied (`min = 0`).
    pub fn optional(
        namespace: impl Into<String>,
        name: impl Into<String>,
        range: VersionRange,
    ) -> Self {
        Self::with_cardinality(namespace, name, range, 0, 1)
    }

    /// A requirement that must not be satisfied (`max = 0`).
    pub fn excluded(
        namespace: impl Into<String>,
        name: impl Into<String>,
        range: VersionRange,
    ) -> Self {
        Self::with_cardinality(namespace, name, range, 0, 0)
    }

    /// The "fragment of host `name`" meta-requirement.
    pub fn host(name: impl Into<String>, range: VersionRange) -> Self {
        Self {
            kind: RequirementKind::Meta,
            ..Self::mandatory(namespace::BUNDLE, name, range)
        }
    }

    /// Whether the requirement may stay unsatisfied.
    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// Whether the requirement is a negative one and skipped by resolution.
    pub fn is_excluded(&self) -> bool {
        self.max == 0
    }

    /// Whether this is a structural requirement.
    pub fn is_meta(&self) -> bool {
        self.kind == RequirementKind::Meta
    }

    /// Whether `capability` satisfies this requirement's match predicate.
    pub fn matches(&self, capability: &Capability) -> bool {
        capability.namespace == self.namespace
            && capability.name == self.name
            && self.range.contains(&capability.version)
    }

    /// Parse the compact requirement syntax used by install plans.
    ///
    /// `namespace:name[@range]` with an optional trailing `?` (optional) or
    /// `!` (excluded). Without a namespace the bundle namespace is assumed. A
    /// `host:` prefix produces a fragment-host meta-requirement.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidRequirement`] when the name is missing,
    /// or a range error if the range does not parse.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let input = s.trim();
        let invalid = || SchemaError::InvalidRequirement(input.to_string());

        let (body, min, max) = if let Some(body) = input.strip_suffix('?') {
            (body, 0, 1)
        } else if let Some(body) = input.strip_suffix('!') {
            (body, 0, 0)
        } else {
            (input, 1, 1)
        };

        let (head, range) = match body.split_once('@') {
            Some((head, range)) => (head, VersionRange::parse(range)?),
            None => (body, VersionRange::Any),
        };

        let (kind, namespace, name) = match head.split_once(':') {
            Some(("host", name)) => (RequirementKind::Meta, namespace::BUNDLE, name),
            Some((namespace, name)) => (RequirementKind::Plain, namespace, name),
            None => (RequirementKind::Plain, namespace::BUNDLE, head),
        };
        if namespace.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            kind,
            ..Self::with_cardinality(namespace, name, range, min, max)
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_meta() {
            write!(f, "host:{}@{}", self.name, self.range)?;
        } else {
            write!(f, "{}:{}@{}", self.namespace, self.name, self.range)?;
        }
        if self.is_excluded() {
            write!(f, "!")
        } else if self.is_optional() {
            write!(f, "?")
        } else {
            Ok(())
        }
    }
}

impl FromStr for Requirement {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Requirement {
    type Error = SchemaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Requirement> for String {
    fn from(r: Requirement) -> Self {
        r.to_string()
    }
}
