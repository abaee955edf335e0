#![warn(clippy::unwrap_in_result)]
#![warn(clippy::unwrap_used)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Metadata record of a stored file.
///
/// One row per uploaded blob. The record describes where the content lives
/// on disk and how it was declared by the client; the content itself is kept
/// outside the metadata store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlobRecord {
    /// Unique numeric identifier, assigned on creation and never reused
    pub id: i64,
    /// Client-supplied filename, kept for display only
    pub original_name: String,
    /// Client-declared content type, returned as Content-Type on retrieval
    pub mime_type: String,
    /// System-generated on-disk file name inside the storage directory
    pub path: String,
    /// Creation time, set once
    pub uploaded_at: DateTime<Utc>,
}
