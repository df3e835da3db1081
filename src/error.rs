//! Error types for typebus

use thiserror::Error;

/// Errors that can occur in the event bus
///
/// Registration, posting, and unregistration are infallible by design:
/// unknown tokens, missing identities, and zero-subscriber posts are all
/// silent no-ops. Errors only arise from execution-queue lifecycle.
#[derive(Debug, Error)]
pub enum BusError {
    /// Worker thread for a queue could not be spawned
    #[error("Failed to spawn worker thread for queue '{0}'")]
    QueueSpawn(String),

    /// Queue worker thread panicked before it could be joined
    #[error("Failed to join worker thread for queue '{0}'")]
    QueueJoin(String),
}

/// Result type alias for bus operations
pub type Result<T> = std::result::Result<T, BusError>;
