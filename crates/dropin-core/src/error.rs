//! Domain-specific errors for installation requests

use thiserror::Error;

/// Errors that abort an installation request.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The request cannot be processed at all (e.g. no main package name).
    #[error("Invalid install request: {0}")]
    InvalidRequest(String),

    /// Virtual metapackages are still shared by several dependents after
    /// consolidation and splitting. `dump` lists each one with its dependents.
    #[error("There are {count} unmerged virtual metapackages")]
    UnmergedVirtualPackages {
        /// Number of offending virtual packages.
        count: usize,
        /// Human-readable contents of each offender and its dependents.
        dump: String,
    },
}
