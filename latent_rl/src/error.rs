//! Error types for latent_rl.
//!
//! Shape mismatches inside a forward pass are left to Burn; only
//! configuration, grid and checkpoint failures are reported here.

use thiserror::Error;

/// Result type for latent_rl operations.
pub type Result<T> = std::result::Result<T, LatentRlError>;

/// Errors that can occur while configuring, persisting or sweeping models.
#[derive(Debug, Error)]
pub enum LatentRlError {
    /// A model configuration is internally inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A hyperparameter grid could not be built.
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// IO error during checkpoint save/load.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Burn recorder error.
    #[error("Recorder error: {0}")]
    Recorder(String),

    /// No checkpoints found.
    #[error("No checkpoints found")]
    NoCheckpoints,

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LatentRlError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid grid error
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }
}

/// Fail with [`LatentRlError::InvalidConfig`] unless `cond` holds.
pub(crate) fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(LatentRlError::InvalidConfig(msg()))
    }
}
