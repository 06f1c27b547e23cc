//! Scheduler error types.

use thiserror::Error;

/// Result type alias for scheduling operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors that can occur during scheduling operations.
///
/// `NoSuitableNode` is reportable, not fatal: the caller may retry once
/// more nodes have heartbeated in.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("no suitable node")]
    NoSuitableNode,

    #[error("registry error: {0}")]
    Registry(#[from] fogplane_registry::RegistryError),

    #[error("state store error: {0}")]
    State(#[from] fogplane_state::StateError),
}
