use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file I/O failed: {path}: {source}")]
    SessionIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file is corrupt: {0}")]
    SessionFormat(#[from] serde_json::Error),

    #[error("not logged in")]
    NoSession,
}
