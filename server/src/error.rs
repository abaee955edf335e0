use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur during blob storage operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The upload exceeds the configured size limit.
    #[error("file of {actual} bytes exceeds the size limit of {limit} bytes")]
    TooLarge { actual: u64, limit: u64 },
    /// The declared content type is not in the allow list.
    #[error("content type '{0}' is not allowed")]
    TypeNotAllowed(String),
    /// The identifier is not a positive integer.
    #[error("invalid file id: {0}")]
    InvalidId(String),
    /// No metadata row exists for the identifier.
    #[error("file {0} not found")]
    NotFound(i64),
    /// A metadata row exists but its on-disk content does not.
    #[error("content of file {0} is missing from storage")]
    FileMissing(i64),
    /// Writing the file content to disk failed.
    #[error("failed to write file content: {0}")]
    Write(#[source] std::io::Error),
    /// Any other filesystem failure while reading or removing content.
    #[error("file system failure: {0}")]
    Io(#[source] std::io::Error),
    /// The metadata store failed.
    #[error("metadata store failure: {0}")]
    Store(#[from] rusqlite::Error),
}

impl BlobError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::TypeNotAllowed(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::FileMissing(_) => StatusCode::GONE,
            Self::Write(_) | Self::Io(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BlobError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
