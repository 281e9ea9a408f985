//! HTTP surface for pathprune
//!
//! Every request carries its own document; the server keeps no state
//! between calls.

#![forbid(unsafe_code)]

use axum::{routing::get, routing::post, Json, Router};
use pathprune::{FilterConfig, Format, Session};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PathsRequest {
    content: String,
    format: ApiFormat,
}

#[derive(Debug, Deserialize)]
struct PruneRequest {
    content: String,
    format: ApiFormat,
    #[serde(default)]
    filter: FilterConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum ApiFormat {
    Xml,
    Json,
}

impl From<ApiFormat> for Format {
    fn from(value: ApiFormat) -> Self {
        match value {
            ApiFormat::Xml => Self::Xml,
            ApiFormat::Json => Self::Json,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum ApiResponse {
    Ok { data: serde_json::Value },
    Error { error: String },
}

impl From<Result<serde_json::Value, String>> for ApiResponse {
    fn from(result: Result<serde_json::Value, String>) -> Self {
        match result {
            Ok(data) => Self::Ok { data },
            Err(error) => Self::Error { error },
        }
    }
}

#[derive(Debug, Serialize)]
struct PruneOutcome {
    content: String,
    original: usize,
    filtered: usize,
    savings: i64,
    included: Vec<String>,
    excluded: Vec<String>,
}

/// Router with every endpoint and a permissive CORS layer
pub fn app() -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/formats", get(formats))
        .route("/api/paths", post(paths))
        .route("/api/prune", post(prune))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn formats() -> Json<Vec<&'static str>> {
    Json(vec!["xml", "json"])
}

async fn paths(Json(payload): Json<PathsRequest>) -> Json<ApiResponse> {
    Json(path_overview(&payload.content, payload.format).into())
}

async fn prune(Json(payload): Json<PruneRequest>) -> Json<ApiResponse> {
    Json(prune_content(&payload.content, payload.format, &payload.filter).into())
}

fn open(content: &str, format: ApiFormat) -> Result<Session, String> {
    let format = Format::from(format);
    Session::open(format!("upload.{}", format.extension()), content.as_bytes())
        .map_err(|err| err.to_string())
}

fn path_overview(content: &str, format: ApiFormat) -> Result<serde_json::Value, String> {
    let session = open(content, format)?;
    serde_json::to_value(session.stats()).map_err(|err| err.to_string())
}

fn prune_content(
    content: &str,
    format: ApiFormat,
    filter: &FilterConfig,
) -> Result<serde_json::Value, String> {
    let mut session = open(content, format)?;
    let selection = session.apply(filter).map_err(|err| err.to_string())?;
    let report = session.size_report().map_err(|err| err.to_string())?;
    let bytes = session.pruned().to_bytes().map_err(|err| err.to_string())?;
    debug!(
        excluded = selection.excluded.len(),
        filtered = report.filtered,
        "pruned upload"
    );

    let outcome = PruneOutcome {
        content: String::from_utf8_lossy(&bytes).into_owned(),
        original: report.original,
        filtered: report.filtered,
        savings: report.savings(),
        included: selection.included.into_iter().collect(),
        excluded: selection.excluded.into_iter().collect(),
    };
    serde_json::to_value(outcome).map_err(|err| err.to_string())
}
