use std::path::PathBuf;

/// Errors surfaced by the core library.
///
/// Running countdowns never fail: an elapsed or unparseable target is a
/// normal terminal state. Errors only come from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid manifest {}: {message}", file.display())]
    Manifest { file: PathBuf, message: String },

    #[error("invalid UTC offset {0:?} (expected +HH:MM or -HH:MM)")]
    InvalidOffset(String),
}
