//! Unit model for dropin partitioning.
//!
//! A [`Unit`] is one installable item (a bundle or a feature) together with
//! the capabilities it provides and the requirements it declares. Everything
//! here is immutable once built; the resolver in `dropin-core` only ever reads
//! these types.

pub mod error;
pub mod types;
pub mod unit;
pub mod version;

// Re-exports
pub use error::SchemaError;
pub use types::*;
pub use unit::{ArtifactKey, ArtifactKind, ArtifactShape, Unit};
pub use version::{Version, VersionRange};
