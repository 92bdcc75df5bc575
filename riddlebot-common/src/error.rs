// riddlebot-common/src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Library loading error: {0}")]
    LibLoading(#[from] libloading::Error),

    /// A discovered module is not a loadable definition unit. Callers log
    /// this and skip the module; it never aborts a registration batch.
    #[error("Load error: {0}")]
    Load(String),

    #[error("Platform error: {0}")]
    Platform(String),

    /// Remote manifest publish/delete failed. Logged and surfaced to the
    /// operator; already-registered in-process definitions are unaffected.
    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Handler error: {0}")]
    Handler(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Platform(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Platform(s.to_string())
    }
}
