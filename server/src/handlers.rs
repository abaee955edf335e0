use crate::error::BlobError;
use crate::file_reply::FileReply;
use crate::repository::BlobRepository;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use futures::{Stream, TryStreamExt};
use kernel::BlobRecord;
use std::io;
use std::sync::Arc;
use tokio_util::io::StreamReader;

use axum::{
    extract::{Multipart, Path},
    http::StatusCode,
};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Adds files from a multipart form into the store.
#[utoipa::path(
    post,
    path = "/api/files",
    responses(
        (status = 201, description = "Files created successfully", body = [i64]),
        (status = 413, description = "File exceeds the size limit", body = String),
        (status = 415, description = "Content type not allowed", body = String),
        (status = 500, description = "Server error", body = String)
    ),
    tag = "files",
)]
pub async fn insert_files(
    State(repository): State<Arc<BlobRepository>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, BlobError> {
    let mut inserted: Vec<i64> = vec![];
    while let Ok(Some(field)) = multipart.next_field().await {
        let file_name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field
            .content_type()
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        let (data, read_bytes) = read_from_stream(field).await.map_err(BlobError::Io)?;

        match repository.create(&data, &file_name, &mime_type).await {
            Ok(id) => {
                tracing::info!("file: {file_name} read: {read_bytes} file id: {id}");
                inserted.push(id);
            }
            Err(e) => {
                tracing::error!("file '{file_name}' not inserted. Error: {e}");
                return Err(e);
            }
        }
    }

    Ok((StatusCode::CREATED, Json(inserted)))
}

/// Lists all stored files, newest first.
#[utoipa::path(
    get,
    path = "/api/files",
    responses(
        (status = 200, description = "List all files successfully", body = [BlobRecord]),
    ),
    tag = "files",
)]
pub async fn get_files(
    State(repository): State<Arc<BlobRepository>>,
) -> Result<impl IntoResponse, BlobError> {
    let result = repository.list()?;
    Ok(Json(result))
}

/// Gets file binary content by file id.
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    responses(
        (status = 200, response = FileReply),
        (status = 400, description = "Malformed file id", body = String),
        (status = 404, description = "File not found", body = String),
        (status = 410, description = "File content is missing", body = String)
    ),
    tag = "files",
    params(
        ("id" = i64, Path, description = "File id")
    ),
)]
pub async fn get_file_content(
    Path(id): Path<String>,
    State(repository): State<Arc<BlobRepository>>,
) -> Result<impl IntoResponse, BlobError> {
    let id = parse_id(&id)?;
    let (file, record) = repository.retrieve(id).await?;
    let len = file.metadata().await.map_err(BlobError::Io)?.len();
    tracing::info!("File size {len}");
    Ok(FileReply::new(file, record, len))
}

/// Gets file metadata by file id.
#[utoipa::path(
    get,
    path = "/api/files/{id}/meta",
    responses(
        (status = 200, body = BlobRecord),
        (status = 400, description = "Malformed file id", body = String),
        (status = 404, description = "File not found", body = String)
    ),
    tag = "files",
    params(
        ("id" = i64, Path, description = "File id")
    ),
)]
pub async fn get_file_info(
    Path(id): Path<String>,
    State(repository): State<Arc<BlobRepository>>,
) -> Result<impl IntoResponse, BlobError> {
    let id = parse_id(&id)?;
    let (_, record) = repository.retrieve(id).await?;
    Ok(Json(record))
}

/// Deletes file by id.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    responses(
        (status = 204, description = "File successfully deleted"),
        (status = 400, description = "Malformed file id", body = String),
        (status = 404, description = "File not found", body = String)
    ),
    tag = "files",
    params(
        ("id" = i64, Path, description = "File id")
    ),
)]
pub async fn delete_file(
    Path(id): Path<String>,
    State(repository): State<Arc<BlobRepository>>,
) -> Result<impl IntoResponse, BlobError> {
    let id = parse_id(&id)?;
    match repository.remove(id).await {
        Ok(()) => {
            tracing::info!("file: {id} deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            tracing::error!("file '{id}' not deleted. Error: {e}");
            Err(e)
        }
    }
}

/// Identifiers must be positive integers; anything else is rejected before
/// the repository is consulted.
fn parse_id(raw: &str) -> Result<i64, BlobError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| BlobError::InvalidId(raw.to_owned()))
}

async fn read_from_stream<S, E>(stream: S) -> io::Result<(Vec<u8>, usize)>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Sync + std::error::Error + Send + 'static,
{
    // Convert the stream into an `AsyncRead`.
    let body_with_io_error = stream.map_err(io::Error::other);
    let body_reader = StreamReader::new(body_with_io_error);
    futures::pin_mut!(body_reader);
    let mut buffer = Vec::new();

    let copied_bytes = tokio::io::copy(&mut body_reader, &mut buffer).await?;
    let copied_bytes = usize::try_from(copied_bytes).unwrap_or(usize::MAX);
    Ok((buffer, copied_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", Some(1))]
    #[case("42", Some(42))]
    #[case("0", None)]
    #[case("-7", None)]
    #[case("abc", None)]
    #[case("1.5", None)]
    #[case("", None)]
    #[trace]
    fn parse_id_accepts_positive_integers_only(#[case] raw: &str, #[case] expected: Option<i64>) {
        // Act
        let parsed = parse_id(raw);

        // Assert
        match expected {
            Some(id) => assert_eq!(parsed.unwrap(), id),
            None => assert!(matches!(parsed, Err(BlobError::InvalidId(_)))),
        }
    }
}
