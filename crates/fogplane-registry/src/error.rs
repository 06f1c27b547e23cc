//! Registry error types.

use thiserror::Error;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A zero TTL would make every node dead on arrival. Contract
    /// violation, rejected at construction rather than per-request.
    #[error("node TTL must be greater than zero")]
    InvalidTtl,

    #[error("state store error: {0}")]
    State(#[from] fogplane_state::StateError),
}
