//! `serve`: read-only HTTP view of a results directory
//!
//! - `GET /` returns the sweep manifest
//! - `GET /profiles/{id}` returns one profile's counters and, when present,
//!   its detail report (`current` names the latest pass)
//! - `/files/...` serves the raw artifacts

#![allow(clippy::unused_async)]

use super::reporter;
use crate::commands::ServeArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use perfsweep::config::is_archive_id;
use perfsweep::profile::{self, read_detail};
use perfsweep::sweep::{archived_detail_name, archived_profile_name};
use perfsweep::{HarnessError, SweepManifest, DETAIL_FILE, PROFILE_FILE};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Profile id that maps to the latest pass rather than an archive
pub const CURRENT_PROFILE: &str = "current";

#[derive(Clone)]
struct ViewerState {
    results: Arc<PathBuf>,
}

/// Build the viewer's router for `results`
pub fn router(results: PathBuf) -> Router {
    let files = ServeDir::new(&results);
    let state = ViewerState {
        results: Arc::new(results),
    };

    Router::new()
        .route("/", get(manifest))
        .route("/profiles/{id}", get(profile_by_id))
        .nest_service("/files", files)
        .with_state(state)
}

async fn manifest(State(state): State<ViewerState>) -> Response {
    match SweepManifest::load(&state.results) {
        Ok(manifest) => Json(manifest).into_response(),
        Err(HarnessError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "no sweep manifest in results directory").into_response()
        }
        Err(e) => internal_error(&e),
    }
}

async fn profile_by_id(State(state): State<ViewerState>, Path(id): Path<String>) -> Response {
    if !is_archive_id(&id) {
        return (StatusCode::BAD_REQUEST, "invalid profile id").into_response();
    }

    let (summary_name, detail_name) = if id == CURRENT_PROFILE {
        (PROFILE_FILE.to_string(), DETAIL_FILE.to_string())
    } else {
        (archived_profile_name(&id), archived_detail_name(&id))
    };

    let summary_path = state.results.join(summary_name);
    if !summary_path.is_file() {
        return (StatusCode::NOT_FOUND, format!("no profile `{id}`")).into_response();
    }
    let counters = match profile::parse(&summary_path) {
        Ok(parsed) => parsed
            .counters()
            .iter()
            .map(|(key, value)| serde_json::json!({ "key": key, "value": value }))
            .collect::<Vec<_>>(),
        Err(e) => return internal_error(&e),
    };

    let detail_path = state.results.join(detail_name);
    let detail = if detail_path.is_file() {
        match read_detail(&detail_path) {
            Ok(detail) => Some(detail),
            Err(e) => return internal_error(&e),
        }
    } else {
        None
    };

    Json(serde_json::json!({
        "id": id,
        "counters": counters,
        "detail": detail,
    }))
    .into_response()
}

fn internal_error(e: &HarnessError) -> Response {
    warn!(error = %e, "viewer request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

/// Format a server URL from port
#[must_use]
pub fn format_server_url(port: u16) -> String {
    format!("http://localhost:{port}")
}

/// Execute the serve command (blocks until Ctrl+C)
pub fn execute_serve(config: &CliConfig, args: &ServeArgs) -> CliResult<()> {
    if !args.results.is_dir() {
        return Err(CliError::invalid_argument(format!(
            "results directory {} does not exist",
            args.results.display()
        )));
    }

    let app = router(args.results.clone());
    let app = if args.cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    };

    let reporter = reporter(config);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::server(format!("Failed to create runtime: {e}")))?;

    rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| CliError::server(format!("cannot bind {addr}: {e}")))?;
        info!(%addr, results = %args.results.display(), "viewer listening");
        reporter.info(&format!(
            "serving {} at {} (Ctrl+C to stop)",
            args.results.display(),
            format_server_url(args.port)
        ));

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .map_err(|e| CliError::server(e.to_string()))
    })
}
