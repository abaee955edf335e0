use std::path::PathBuf;

use client::FileParams;

pub async fn insert_single_file(params: FileParams) {
    client::insert_file(params).await;
}

pub async fn list_files(uri: &str) {
    client::list_files(uri).await;
}

pub async fn get_single_file(uri: &str, id: i64, output: Option<PathBuf>) {
    client::get_file(uri, id, output).await;
}

pub async fn delete_single_file(uri: &str, id: i64) {
    client::delete_file(uri, id).await;
}
