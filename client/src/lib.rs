use std::io;
use std::path::PathBuf;

use comfy_table::{presets::UTF8_HORIZONTAL_ONLY, Attribute, Cell, ContentArrangement, Table};
use futures::TryStreamExt;
use kernel::BlobRecord;
use reqwest::Client;
use tokio::fs::File;
use tokio_util::io::{ReaderStream, StreamReader};
use url::Url;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

pub struct FileParams {
    pub uri: String,
    pub file: String,
    pub mime_type: Option<String>,
}

fn api_url(base: &str, segments: &[&str]) -> Option<Url> {
    let mut url = Url::parse(base).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(["api", "files"])
        .extend(segments);
    Some(url)
}

pub async fn insert_file(params: FileParams) {
    let path = PathBuf::from(&params.file);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = params
        .mime_type
        .unwrap_or_else(|| String::from(DEFAULT_MIME_TYPE));

    let Some(url) = api_url(&params.uri, &[]) else {
        println!("invalid server uri: {}", params.uri);
        return;
    };

    let error_message = format!("no such file {}", &params.file);
    let f = File::open(&params.file).await.expect(&error_message);
    let len = f.metadata().await.map(|m| m.len()).unwrap_or_default();
    let stream = ReaderStream::new(f);
    let stream = reqwest::Body::wrap_stream(stream);

    let part = match reqwest::multipart::Part::stream_with_length(stream, len)
        .file_name(file_name)
        .mime_str(&mime_type)
    {
        Ok(p) => p,
        Err(e) => {
            println!("invalid content type '{mime_type}': {e}");
            return;
        }
    };
    let form = reqwest::multipart::Form::new().part("file", part);

    let client = Client::new();
    let result = client.post(url.to_string()).multipart(form).send().await;
    match result {
        Ok(x) => {
            println!("file {} inserted. Status: {}", params.file, x.status());
        }
        Err(e) => {
            println!("insert error: {e}");
        }
    }
}

pub async fn list_files(uri: &str) {
    let Some(url) = api_url(uri, &[]) else {
        println!("invalid server uri: {uri}");
        return;
    };

    let client = Client::new();

    match client.get(url.to_string()).send().await {
        Ok(response) => match response.json().await {
            Ok(r) => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_HORIZONTAL_ONLY)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_width(120)
                    .set_header(vec![
                        Cell::new("Id").add_attribute(Attribute::Bold),
                        Cell::new("Name").add_attribute(Attribute::Bold),
                        Cell::new("Type").add_attribute(Attribute::Bold),
                        Cell::new("Stored as").add_attribute(Attribute::Bold),
                        Cell::new("Uploaded at").add_attribute(Attribute::Bold),
                    ]);

                let files: Vec<BlobRecord> = r;
                for f in files {
                    table.add_row(vec![
                        Cell::new(f.id),
                        Cell::new(f.original_name),
                        Cell::new(f.mime_type),
                        Cell::new(f.path),
                        Cell::new(f.uploaded_at.to_rfc3339()),
                    ]);
                }
                println!("{table}");
            }
            Err(e) => println!("JSON decode error: {e}"),
        },
        Err(e) => {
            println!("error: {e}");
        }
    }
}

pub async fn get_file(uri: &str, id: i64, output: Option<PathBuf>) {
    let id_segment = id.to_string();
    let Some(url) = api_url(uri, &[&id_segment]) else {
        println!("invalid server uri: {uri}");
        return;
    };

    let client = Client::new();
    let response = match client.get(url.to_string()).send().await {
        Ok(r) => r,
        Err(e) => {
            println!("error: {e}");
            return;
        }
    };

    if !response.status().is_success() {
        println!("file {id} not downloaded. Status: {}", response.status());
        return;
    }

    let stream = response
        .bytes_stream()
        .map_err(io::Error::other);
    let reader = StreamReader::new(stream);
    futures::pin_mut!(reader);

    let result = match output {
        Some(target) => {
            let error_message = format!("cannot create file {}", target.display());
            let mut f = File::create(&target).await.expect(&error_message);
            tokio::io::copy(&mut reader, &mut f).await
        }
        None => tokio::io::copy(&mut reader, &mut tokio::io::stdout()).await,
    };

    match result {
        Ok(written) => println!("file {id} downloaded. {written} bytes"),
        Err(e) => println!("download error: {e}"),
    }
}

pub async fn delete_file(uri: &str, id: i64) {
    let id_segment = id.to_string();
    let Some(url) = api_url(uri, &[&id_segment]) else {
        println!("invalid server uri: {uri}");
        return;
    };

    let client = Client::new();
    match client.delete(url.to_string()).send().await {
        Ok(response) => {
            println!("file {id} delete status: {}", response.status());
        }
        Err(e) => {
            println!("error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost", &[], "http://localhost/api/files")]
    #[case("http://localhost/", &[], "http://localhost/api/files")]
    #[case("http://localhost:5000", &[], "http://localhost:5000/api/files")]
    #[case("http://localhost", &["1"], "http://localhost/api/files/1")]
    #[case("http://localhost", &["1", "meta"], "http://localhost/api/files/1/meta")]
    #[case("http://host/prefix", &["7"], "http://host/prefix/api/files/7")]
    #[trace]
    fn api_url_builds_expected(
        #[case] base: &str,
        #[case] segments: &[&str],
        #[case] expected: &str,
    ) {
        // Act
        let url = api_url(base, segments).unwrap();

        // Assert
        assert_eq!(url.to_string(), expected);
    }

    #[test]
    fn api_url_rejects_invalid_base() {
        // Act
        let url = api_url("http/localhost", &[]);

        // Assert
        assert!(url.is_none());
    }
}
