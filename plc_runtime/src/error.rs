//! Runtime bootstrap errors.

use plc_common::config::ConfigError;
use plc_common::glue::GlueError;
use thiserror::Error;

use crate::service_registry::RegistryError;

/// Errors that stop the runtime from starting.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// Configuration could not be loaded or validated
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The glue map violates the binding contract
    #[error("Glue table error: {0}")]
    Glue(#[from] GlueError),

    /// A service could not be registered
    #[error("Service registration failed: {0}")]
    Registry(#[from] RegistryError),

    /// Glue table generation differs from the recorded one
    #[error("Glue checksum mismatch: expected {expected:?}, program has {actual:?}")]
    ChecksumMismatch {
        /// Checksum recorded in the runtime config.
        expected: String,
        /// Checksum carried by the glue map.
        actual: String,
    },

    /// Services failed to initialize and a degraded start is not allowed
    #[error("Services failed to initialize: {}", .0.join(", "))]
    ServicesFailed(Vec<String>),
}

/// Result type for runtime bootstrap operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
