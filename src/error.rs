//! Error types

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for engine operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed bubble {id}: {reason}")]
    MalformedBubble { id: String, reason: String },

    #[error("Invalid video: {0}")]
    InvalidVideo(String),

    #[error("Overlay container too small: {width}x{height}")]
    DegenerateContainer { width: f32, height: f32 },

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

/// Failures reported by the host player, overlay surface or audio output
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("unavailable")]
    Unavailable,
}
