use std::{path::PathBuf, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    classify::ServerErrorsFailureClass, limit::RequestBodyLimitLayer, trace::TraceLayer,
};
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod domain;
pub mod error;
pub mod file_reply;
mod handlers;
pub mod naming;
pub mod policy;
pub mod repository;
pub mod sqlite;

use crate::domain::MetadataStore;
use crate::error::BlobError;
use crate::policy::UploadPolicy;
use crate::repository::BlobRepository;
use crate::sqlite::{Mode, Sqlite};
use std::env;
use std::net::SocketAddr;
use std::path::Path;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DB_FILE: &str = "fstore.db";
const CURRENT_DIR: &str = "./";
const STORAGE_SUBDIR: &str = "files";
const DEFAULT_SIZE_LIMIT: u64 = 2 * 1024 * 1024 * 1024; // 2GB

/// Everything an operation needs: the metadata store location, the storage
/// directory and the upload policy. Fixed at startup.
pub struct ServerConfig {
    pub db: PathBuf,
    pub storage_dir: PathBuf,
    pub policy: UploadPolicy,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::insert_files,
        handlers::get_files,
        handlers::get_file_content,
        handlers::get_file_info,
        handlers::delete_file
    ),
    components(schemas(kernel::BlobRecord), responses(file_reply::FileReply))
)]
struct ApiDoc;

pub async fn run() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "fstore=debug,server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration from environment
    let db_file = env::var("FSTORE_DB_FILE").unwrap_or_else(|_| String::from(DB_FILE));
    let dir = env::var("FSTORE_DATA_DIR").unwrap_or_else(|_| String::from(CURRENT_DIR));
    let port = env::var("FSTORE_PORT").unwrap_or_else(|_| String::from("5000"));
    let size_limit = env::var("FSTORE_MAX_FILE_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SIZE_LIMIT);
    let allowed_types = env::var("FSTORE_ALLOWED_TYPES")
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    // Start init
    let db = Path::new(&dir).join(&db_file);
    if !db.exists() {
        Sqlite::open(db.clone(), Mode::ReadWrite)
            .expect("Database file cannot be created")
            .new_database()
            .unwrap_or_default();
    }

    let config = ServerConfig {
        db,
        storage_dir: Path::new(&dir).join(STORAGE_SUBDIR),
        policy: UploadPolicy::new(size_limit, allowed_types),
    };

    let socket: SocketAddr = format!("0.0.0.0:{port}").parse().unwrap();
    tracing::debug!("listening on {socket}");

    let app = create_routes(config).expect("Storage directory cannot be created");

    let listener = tokio::net::TcpListener::bind(socket).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

pub fn create_routes(config: ServerConfig) -> Result<Router, BlobError> {
    let repository = Arc::new(BlobRepository::new(
        config.db,
        config.storage_dir,
        config.policy,
    )?);
    let router = Router::new()
        .route(
            "/api/files",
            post(handlers::insert_files).get(handlers::get_files),
        )
        .route(
            "/api/files/:id",
            get(handlers::get_file_content).delete(handlers::delete_file),
        )
        .route("/api/files/:id/meta", get(handlers::get_file_info))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().on_failure(
                    |error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                        tracing::error!("Server error: {error}");
                    },
                ))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(
                    2 * 1024 * 1024 * 1024, /* 2GB */
                ))
                .into_inner(),
        )
        .with_state(repository);
    Ok(router)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    println!("signal received, starting graceful shutdown");
}
