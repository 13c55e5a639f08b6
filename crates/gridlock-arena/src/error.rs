//! Error types for the arena layer.

/// Errors that can occur while creating or releasing an arena.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// The requested layout is not usable (participant count, quorum,
    /// log capacity).
    #[error("invalid arena config: {0}")]
    InvalidConfig(String),

    /// The arena cannot be released while other handles are attached.
    #[error("arena still has {0} attached handle(s)")]
    StillAttached(usize),
}
