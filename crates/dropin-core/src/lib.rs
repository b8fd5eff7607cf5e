//! dropin core - partitions co-installed units into dropin packages.
//!
//! # Pipeline
//!
//! ```text
//! reactor units + repository tiers
//!     │
//!     ├──> builder      physical packages from explicit mappings, one virtual per leftover unit
//!     ├──> resolver     requirement matching per tier, package edges, "requires" lists
//!     ├──> consolidate  strongly connected components merged into one package
//!     ├──> split        shared external references cloned per dependent
//!     ├──> expand       virtual packages folded into their single dependent (or main)
//!     └──> placement    package name → provides / symlinks
//! ```
//!
//! Everything runs single-threaded and in insertion order, so identical input
//! always yields identical output.

pub mod builder;
pub mod catalog;
pub mod consolidate;
pub mod error;
pub mod expand;
pub mod installer;
pub mod metapackage;
pub mod placement;
#[cfg(feature = "parsing")]
pub mod plan;
pub mod repository;
pub mod resolver;
pub mod split;

pub use error::InstallError;
pub use installer::{InstallRequest, Installer};
pub use placement::{Dropin, Placement, Provide, SymlinkRef};
pub use repository::{StaticRepository, Tier, UnitRepository};

/// Property key carrying the comma-joined requires list of a provide.
pub const REQUIRES_PROPERTY: &str = "osgi.requires";
