use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::Utc;
use kernel::BlobRecord;
use tokio::fs::File;

use crate::domain::MetadataStore;
use crate::error::BlobError;
use crate::naming::StoredNameGenerator;
use crate::policy::UploadPolicy;
use crate::sqlite::{Mode, Sqlite};

/// Orchestrates create/read/delete across the metadata store and the
/// filesystem.
///
/// The two substrates are not linked by a transaction. A create writes the
/// file first and the row second, so a store failure leaves an orphan file
/// (no row pointing at it); a remove deletes the file first and the row
/// second, so a store failure leaves an orphan row, which later retrievals
/// report as `FileMissing`. Neither orphan class is reconciled here.
pub struct BlobRepository {
    db: PathBuf,
    storage_dir: PathBuf,
    policy: UploadPolicy,
    names: StoredNameGenerator,
}

impl BlobRepository {
    pub fn new(db: PathBuf, storage_dir: PathBuf, policy: UploadPolicy) -> Result<Self, BlobError> {
        std::fs::create_dir_all(&storage_dir).map_err(BlobError::Write)?;
        Ok(Self {
            db,
            storage_dir,
            policy,
            names: StoredNameGenerator::new(),
        })
    }

    /// Validates, writes the content to disk, then records the metadata row.
    /// Returns the freshly allocated id.
    pub async fn create(
        &self,
        bytes: &[u8],
        original_name: &str,
        mime_type: &str,
    ) -> Result<i64, BlobError> {
        self.policy.validate(bytes.len() as u64, mime_type)?;

        let stored_name = self.names.next(original_name);
        let target = self.storage_dir.join(&stored_name);

        tokio::fs::write(&target, bytes)
            .await
            .map_err(BlobError::Write)?;

        let mut store = self.store(Mode::ReadWrite)?;
        let inserted = store.insert(original_name, mime_type, &stored_name, Utc::now());
        match inserted {
            Ok(id) => Ok(id),
            Err(e) => {
                tracing::warn!("file {stored_name} left orphaned: metadata insert failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Looks the record up and opens its backing file for streaming.
    ///
    /// A row whose file is gone is reported as `FileMissing`, never folded
    /// into `NotFound`: the caller needs to know the difference between a
    /// blob that never existed and one whose content was lost.
    pub async fn retrieve(&self, id: i64) -> Result<(File, BlobRecord), BlobError> {
        Self::ensure_valid(id)?;

        let record = self
            .store(Mode::ReadOnly)?
            .get(id)?
            .ok_or(BlobError::NotFound(id))?;

        let path = self.storage_dir.join(&record.path);
        match File::open(&path).await {
            Ok(file) => Ok((file, record)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("orphan metadata row {id}: file {} is gone", record.path);
                Err(BlobError::FileMissing(id))
            }
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    /// Deletes the physical file, then the metadata row.
    ///
    /// The row is only removed once the file is confirmed gone; a failed
    /// file deletion aborts so the row keeps tracking the still retrievable
    /// content.
    pub async fn remove(&self, id: i64) -> Result<(), BlobError> {
        Self::ensure_valid(id)?;

        let record = self
            .store(Mode::ReadOnly)?
            .get(id)?
            .ok_or(BlobError::NotFound(id))?;

        let path = self.storage_dir.join(&record.path);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            // already gone: the row was an orphan, still fine to drop it
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(BlobError::Io(e)),
        }

        self.store(Mode::ReadWrite)?.delete(id)?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<BlobRecord>, BlobError> {
        Ok(self.store(Mode::ReadOnly)?.list_all()?)
    }

    fn store(&self, mode: Mode) -> Result<Sqlite, BlobError> {
        Ok(Sqlite::open(&self.db, mode)?)
    }

    fn ensure_valid(id: i64) -> Result<(), BlobError> {
        if id > 0 {
            Ok(())
        } else {
            Err(BlobError::InvalidId(id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use rstest::rstest;
    use tokio::io::AsyncReadExt;

    fn new_repository(dir: &tempfile::TempDir, policy: UploadPolicy) -> BlobRepository {
        let db = dir.path().join("meta.db");
        Sqlite::open(&db, Mode::ReadWrite)
            .expect("Database file cannot be created")
            .new_database()
            .unwrap();
        BlobRepository::new(db, dir.path().join("files"), policy).unwrap()
    }

    fn open_repository(dir: &tempfile::TempDir) -> BlobRepository {
        new_repository(dir, UploadPolicy::new(u64::MAX, Vec::new()))
    }

    async fn read_all(file: &mut File) -> Vec<u8> {
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer).await.unwrap();
        buffer
    }

    #[tokio::test]
    async fn create_retrieve_remove_round_trip() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let repository = open_repository(&dir);

        // Act
        let id = repository
            .create(b"hello", "a.txt", "text/plain")
            .await
            .unwrap();

        // Assert
        assert_eq!(id, 1);

        let (mut file, record) = repository.retrieve(id).await.unwrap();
        assert_eq!(read_all(&mut file).await, b"hello");
        assert_eq!(record.mime_type, "text/plain");
        assert_eq!(record.original_name, "a.txt");

        repository.remove(id).await.unwrap();
        assert!(matches!(
            repository.retrieve(id).await,
            Err(BlobError::NotFound(1))
        ));
    }

    #[tokio::test]
    async fn retrieve_unknown_id_is_not_found() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let repository = open_repository(&dir);

        // Act & Assert
        assert!(matches!(
            repository.retrieve(42).await,
            Err(BlobError::NotFound(42))
        ));
        assert!(matches!(
            repository.remove(42).await,
            Err(BlobError::NotFound(42))
        ));
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    #[case(i64::MIN)]
    #[trace]
    #[tokio::test]
    async fn non_positive_id_is_rejected_before_lookup(#[case] id: i64) {
        // Arrange: no database behind the repository, so any store access
        // would fail loudly instead of returning InvalidId
        let dir = tempfile::tempdir().unwrap();
        let repository = BlobRepository::new(
            dir.path().join("absent.db"),
            dir.path().join("files"),
            UploadPolicy::new(u64::MAX, Vec::new()),
        )
        .unwrap();

        // Act & Assert
        assert!(matches!(
            repository.retrieve(id).await,
            Err(BlobError::InvalidId(_))
        ));
        assert!(matches!(
            repository.remove(id).await,
            Err(BlobError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn removed_file_stays_removed() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let repository = open_repository(&dir);
        let id = repository.create(b"x", "x.bin", "application/octet-stream").await.unwrap();

        // Act
        repository.remove(id).await.unwrap();

        // Assert
        assert!(matches!(
            repository.retrieve(id).await,
            Err(BlobError::NotFound(_))
        ));
        assert!(matches!(
            repository.remove(id).await,
            Err(BlobError::NotFound(_))
        ));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("files"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let repository = open_repository(&dir);
        for name in ["first.txt", "second.txt", "third.txt"] {
            repository.create(b"data", name, "text/plain").await.unwrap();
        }

        // Act
        let listed = repository.list().unwrap();

        // Assert
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].original_name, "third.txt");
        assert_eq!(listed[1].original_name, "second.txt");
        assert_eq!(listed[2].original_name, "first.txt");
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let repository = new_repository(&dir, UploadPolicy::new(10, Vec::new()));

        // Act
        let result = repository
            .create(b"twenty bytes exactly", "big.bin", "application/octet-stream")
            .await;

        // Assert
        assert!(matches!(
            result,
            Err(BlobError::TooLarge {
                actual: 20,
                limit: 10
            })
        ));
        assert!(repository.list().unwrap().is_empty());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("files"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn disallowed_type_is_rejected() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let repository = new_repository(
            &dir,
            UploadPolicy::new(u64::MAX, vec!["image/png".to_owned()]),
        );

        // Act
        let result = repository.create(b"text", "a.txt", "text/plain").await;

        // Assert
        assert!(matches!(result, Err(BlobError::TypeNotAllowed(_))));
        assert!(repository.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_backing_file_is_reported_distinctly() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let repository = open_repository(&dir);
        let id = repository.create(b"gone", "g.txt", "text/plain").await.unwrap();
        let stored = &repository.list().unwrap()[0].path;
        std::fs::remove_file(dir.path().join("files").join(stored)).unwrap();

        // Act
        let result = repository.retrieve(id).await;

        // Assert
        assert!(matches!(result, Err(BlobError::FileMissing(i)) if i == id));
    }

    #[tokio::test]
    async fn remove_drops_orphan_row_whose_file_is_gone() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let repository = open_repository(&dir);
        let id = repository.create(b"gone", "g.txt", "text/plain").await.unwrap();
        let stored = &repository.list().unwrap()[0].path;
        std::fs::remove_file(dir.path().join("files").join(stored)).unwrap();

        // Act
        repository.remove(id).await.unwrap();

        // Assert
        assert!(matches!(
            repository.retrieve(id).await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn failed_write_leaves_no_metadata_row() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let repository = open_repository(&dir);
        std::fs::remove_dir(dir.path().join("files")).unwrap();

        // Act
        let result = repository.create(b"data", "a.txt", "text/plain").await;

        // Assert
        assert!(matches!(result, Err(BlobError::Write(_))));
        assert!(repository.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_creates_with_same_name_stay_distinct() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let repository = std::sync::Arc::new(open_repository(&dir));

        // Act
        let mut handles = Vec::new();
        for i in 0..10u8 {
            let repository = repository.clone();
            handles.push(tokio::spawn(async move {
                repository.create(&[i], "same.bin", "application/octet-stream").await
            }));
        }
        let ids: Vec<i64> = join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        // Assert
        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 10);

        let listed = repository.list().unwrap();
        let mut stored_names: Vec<_> = listed.iter().map(|r| r.path.clone()).collect();
        stored_names.sort_unstable();
        stored_names.dedup();
        assert_eq!(stored_names.len(), 10);

        for id in ids {
            let (mut file, _) = repository.retrieve(id).await.unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).await.unwrap();
            assert_eq!(content.len(), 1);
        }
    }
}
