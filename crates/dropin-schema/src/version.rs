//! Versions and version ranges.
//!
//! Versions follow the bundle convention `major[.minor[.micro[.qualifier]]]`.
//! Missing numeric segments default to zero and the qualifier compares
//! lexically, so `1.0.0` < `1.0.0.a` < `1.0.0.b` < `1.0.1`.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A totally ordered unit or capability version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u32,
    minor: u32,
    micro: u32,
    qualifier: String,
}

impl Version {
    /// `0.0.0`, which as a requirement range means "any version".
    pub const ZERO: Version = Version {
        major: 0,
        minor: 0,
        micro: 0,
        qualifier: String::new(),
    };

    /// Create a version without a qualifier.
    pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    /// Parse a version string.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyVersion`] for blank input,
    /// [`SchemaError::InvalidSegment`] if a numeric segment is not a number and
    /// [`SchemaError::InvalidQualifier`] if the qualifier has illegal characters.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let input = s.trim();
        if input.is_empty() {
            return Err(SchemaError::EmptyVersion);
        }

        let mut parts = input.splitn(4, '.');
        let mut numbers = [0u32; 3];
        for slot in &mut numbers {
            if let Some(segment) = parts.next() {
                *slot = segment.parse().map_err(|_| SchemaError::InvalidSegment {
                    input: input.to_string(),
                    segment: segment.to_string(),
                })?;
            }
        }

        let qualifier = parts.next().unwrap_or_default();
        let dangling = qualifier.is_empty() && input.ends_with('.');
        if dangling
            || !qualifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(SchemaError::InvalidQualifier(input.to_string()));
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            micro: numbers[2],
            qualifier: qualifier.to_string(),
        })
    }

    /// Whether this is `0.0.0` with no qualifier.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = SchemaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for Version {
    type Error = SchemaError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

/// The version constraint carried by a requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionRange {
    /// Matches every version. Written as `0.0.0` or left empty.
    #[default]
    Any,
    /// Matches exactly one version.
    Exact(Version),
    /// Matches an interval; an absent upper bound is unbounded.
    Interval {
        /// Lower bound.
        min: Version,
        /// Whether `min` itself matches (`[` vs `(`).
        min_inclusive: bool,
        /// Upper bound, `None` for open-ended ranges such as `[1.0,)`.
        max: Option<Version>,
        /// Whether `max` itself matches (`]` vs `)`).
        max_inclusive: bool,
    },
}

impl VersionRange {
    /// Whether `version` satisfies this range.
    pub fn contains(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(v) => v == version,
            Self::Interval {
                min,
                min_inclusive,
                max,
                max_inclusive,
            } => {
                let above = if *min_inclusive {
                    version >= min
                } else {
                    version > min
                };
                let below = match max {
                    None => true,
                    Some(max) if *max_inclusive => version <= max,
                    Some(max) => version < max,
                };
                above && below
            }
        }
    }

    /// Parse a range such as `[2.5,5.0.0)`, `1.2.3` or `0.0.0`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidRange`] for malformed or empty intervals,
    /// or a version error if one of the bounds does not parse.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let input = s.trim();
        if input.is_empty() {
            return Ok(Self::Any);
        }

        let Some(first) = input.chars().next() else {
            return Ok(Self::Any);
        };
        if first != '[' && first != '(' {
            let version = Version::parse(input)?;
            return Ok(if version.is_zero() {
                Self::Any
            } else {
                Self::Exact(version)
            });
        }

        let invalid = || SchemaError::InvalidRange(input.to_string());
        let last = input.chars().last().ok_or_else(invalid)?;
        if input.len() < 3 || (last != ']' && last != ')') {
            return Err(invalid());
        }

        let body = &input[1..input.len() - 1];
        let (low, high) = body.split_once(',').ok_or_else(invalid)?;
        let min = Version::parse(low)?;
        let max = if high.trim().is_empty() {
            None
        } else {
            Some(Version::parse(high)?)
        };
        let min_inclusive = first == '[';
        let max_inclusive = last == ']';

        if let Some(max) = &max {
            let empty = max < &min || (max == &min && !(min_inclusive && max_inclusive));
            if empty {
                return Err(invalid());
            }
        }

        Ok(Self::Interval {
            min,
            min_inclusive,
            max,
            max_inclusive,
        })
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "{}", Version::ZERO),
            Self::Exact(v) => write!(f, "{v}"),
            Self::Interval {
                min,
                min_inclusive,
                max,
                max_inclusive,
            } => {
                let open = if *min_inclusive { '[' } else { '(' };
                let close = if *max_inclusive { ']' } else { ')' };
                match max {
                    Some(max) => write!(f, "{open}{min},{max}{close}"),
                    None => write!(f, "{open}{min},{close}"),
                }
            }
        }
    }
}

impl FromStr for VersionRange {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = SchemaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<VersionRange> for String {
    fn from(r: VersionRange) -> Self {
        r.to_string()
    }
}

impl From<Version> for VersionRange {
    fn from(v: Version) -> Self {
        if v.is_zero() { Self::Any } else { Self::Exact(v) }
    }
}
