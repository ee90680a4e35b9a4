/// Neither the capture nor the upload timestamp of a record could be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("record {id} has no valid timestamp (upload time {upload_at:?})")]
pub struct InvalidTimestamp {
    pub id: String,
    pub upload_at: String,
}

/// Failures reported by a [`PhotoBackend`](crate::backend::PhotoBackend).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed library data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("photo already in library: {0}")]
    DuplicateContent(String),

    #[error("photo not found: {0}")]
    NotFound(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidTimestamp(#[from] InvalidTimestamp),

    #[error("failed to load photos: {0}")]
    LoadFailure(String),

    #[error("failed to create photo: {0}")]
    CreateFailure(#[source] BackendError),

    #[error("failed to remove photo: {0}")]
    RemoveFailure(#[source] BackendError),

    #[error("photo not in collection: {0}")]
    RecordNotFound(String),

    #[error("settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
