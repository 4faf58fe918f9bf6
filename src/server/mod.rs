//! HTTP surface for the import engine.
//!
//! Exposes the three import operations plus job history as a small JSON
//! API. The server never advances a job on its own; clients drive every
//! batch, and a progress poll from a second client sees live counters.

mod handlers;
mod routes;

pub use handlers::IMPORT_TOKEN_HEADER;
pub use routes::create_router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::importer::ImportEngine;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ImportEngine>,
    /// Relative `file_path` values in start requests resolve here.
    pub uploads_dir: PathBuf,
    /// Shared token required on import requests. None disables the check.
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        let engine = ImportEngine::new(settings.create_db_context())
            .with_batch_size(settings.batch_size)
            .with_record_delay(settings.record_delay());

        Self {
            engine: Arc::new(engine),
            uploads_dir: settings.uploads_dir.clone(),
            api_token: settings.api_token.clone(),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
