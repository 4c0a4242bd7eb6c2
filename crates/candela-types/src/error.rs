//! Error types for candela.

use thiserror::Error;

use crate::Resolution;

/// Result type alias for configuration checks.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Invalid pipeline configuration.
///
/// These errors are detected while a pipeline is being built and are fatal:
/// a pipeline with an invalid configuration never starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Resolution outside the supported or configured set.
    #[error("Unsupported resolution: {0}")]
    UnsupportedResolution(String),

    /// No resolutions were configured.
    #[error("At least one resolution must be configured")]
    EmptyResolutionSet,

    /// A coarser resolution is not a whole multiple of the next finer one.
    #[error("Resolution {coarser} is not a multiple of {finer}")]
    NotNested {
        /// The finer resolution.
        finer: Resolution,
        /// The coarser resolution.
        coarser: Resolution,
    },
}
