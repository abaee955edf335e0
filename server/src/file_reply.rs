use axum::{
    body::Body,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use kernel::BlobRecord;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use utoipa::{
    openapi::{
        self, content,
        schema::{KnownFormat, Schema, SchemaFormat, Type},
        ObjectBuilder, RefOr, ResponseBuilder,
    },
    ToResponse,
};

pub struct FileReply {
    file: File,
    record: BlobRecord,
    len: u64,
}

impl FileReply {
    #[must_use]
    pub fn new(file: File, record: BlobRecord, len: u64) -> Self {
        Self { file, record, len }
    }

    fn attachment_name(&self) -> &str {
        let name = &self.record.original_name;
        if let Some(ix) = name.rfind(['\\', '/']) {
            &name[ix + 1..]
        } else {
            name
        }
    }
}

impl IntoResponse for FileReply {
    fn into_response(self) -> Response {
        let file_name = self.attachment_name().to_owned();
        let content_type = HeaderValue::from_str(&self.record.mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

        let mut res = Body::from_stream(ReaderStream::new(self.file)).into_response();
        res.headers_mut().insert("content-type", content_type);
        let attachment = format!(r#"attachment; filename="{file_name}""#);
        if let Ok(val) = HeaderValue::from_str(attachment.as_str()) {
            res.headers_mut().insert("content-disposition", val);
        }
        let len = self.len.to_string();
        if let Ok(val) = HeaderValue::from_str(len.as_str()) {
            res.headers_mut().insert("Content-Length", val);
        }

        res
    }
}

impl ToResponse<'static> for FileReply {
    fn response() -> (&'static str, RefOr<openapi::Response>) {
        let object_builder = ObjectBuilder::new();
        let object = object_builder
            .schema_type(Type::String)
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Binary)))
            .build();
        let content = content::Content::new(Some(Schema::Object(object)));
        (
            "FileReply",
            ResponseBuilder::new()
                .description("File binary content")
                .content("application/octet-stream", content)
                .build()
                .into(),
        )
    }
}
