use thiserror::Error;

/// Errors raised while parsing the textual forms of schema types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The version string is empty.
    #[error("Empty version string")]
    EmptyVersion,

    /// A numeric segment of a version could not be parsed.
    #[error("Invalid version '{input}': segment '{segment}' is not a number")]
    InvalidSegment {
        /// The full input that failed to parse.
        input: String,
        /// The offending segment.
        segment: String,
    },

    /// The qualifier contains characters outside `[A-Za-z0-9_-]`.
    #[error("Invalid version '{0}': bad qualifier")]
    InvalidQualifier(String),

    /// A version range is malformed (unbalanced brackets, missing comma, empty interval).
    #[error("Invalid version range '{0}'")]
    InvalidRange(String),

    /// A requirement string does not follow `namespace:name[@range][?|!]`.
    #[error("Invalid requirement '{0}'")]
    InvalidRequirement(String),

    /// A capability string does not follow `namespace:name[@version]`.
    #[error("Invalid capability '{0}'")]
    InvalidCapability(String),
}
