use std::fmt::{Debug, Display};

use chrono::{DateTime, Utc};
use kernel::BlobRecord;

/// Durable mapping from blob identifier to file metadata.
///
/// Implementations allocate unique, never reused ids and keep the listing
/// ordered newest first. The file content itself is outside this trait's
/// responsibility.
pub trait MetadataStore {
    type Err: Debug + Display;

    fn new_database(&self) -> Result<(), Self::Err>;

    fn insert(
        &mut self,
        original_name: &str,
        mime_type: &str,
        stored_name: &str,
        uploaded_at: DateTime<Utc>,
    ) -> Result<i64, Self::Err>;

    fn get(&mut self, id: i64) -> Result<Option<BlobRecord>, Self::Err>;

    fn list_all(&mut self) -> Result<Vec<BlobRecord>, Self::Err>;

    fn delete(&mut self, id: i64) -> Result<bool, Self::Err>;
}
