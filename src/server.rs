//! HTTP surface for stored artifacts.
//!
//! Routes:
//!
//! - `GET /files/{owner_id}/{filename}`: the stored object as a download
//! - `GET /files/{owner_id}/{filename}/entries`: names inside the container
//! - `GET /files/{owner_id}/{filename}/entries/{*entry}`: one entry's bytes,
//!   or its recovered JSON document with `?format=json`
//!
//! Missing objects and entries answer 404, unrecoverable JSON answers 422,
//! and storage or decompression failures answer 500 with the error message.

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::artifact::{ArtifactService, EntryLookup};
use crate::config::ServerConfig;
use crate::io::object_key;
use crate::recovery::recover;

/// Content type used when the store has none recorded
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
/// Cache directive for served files
pub const CACHE_CONTROL: &str = "public, max-age=31536000";
/// Response header flagging a partial entry from a clipped container
pub const TRUNCATED_HEADER: &str = "x-archive-truncated";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ArtifactService>,
    pub default_extension: Arc<str>,
}

impl AppState {
    pub fn new(service: ArtifactService, default_extension: &str) -> Self {
        Self {
            service: Arc::new(service),
            default_extension: Arc::from(default_extension),
        }
    }
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub requested_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
}

/// JSON body of the entry listing
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntriesBody {
    pub success: bool,
    pub requested_path: String,
    pub entries: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EntryQuery {
    pub format: Option<String>,
}

pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>, requested_path: &str) -> Self {
        Self {
            status,
            body: ErrorBody {
                success: false,
                error: error.into(),
                requested_path: requested_path.to_string(),
                entry: None,
            },
        }
    }

    fn not_found(requested_path: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "File not found", requested_path)
    }

    fn internal(err: impl std::fmt::Display, requested_path: &str) -> Self {
        error!(requested_path = %requested_path, error = %err, "artifact retrieval failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), requested_path)
    }

    fn with_entry(mut self, entry: &str) -> Self {
        self.body.entry = Some(entry.to_string());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/files/{owner_id}/{filename}", get(get_file))
        .route("/files/{owner_id}/{filename}/entries", get(list_entries))
        .route("/files/{owner_id}/{filename}/entries/{*entry}", get(get_entry))
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &ServerConfig, service: ArtifactService) -> anyhow::Result<()> {
    let app = router(AppState::new(service, &config.default_extension));
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn get_file(
    State(state): State<AppState>,
    Path((owner_id, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let key = object_key(&owner_id, &filename);

    let object = match state.service.fetch(&key).await {
        Ok(Some(object)) => object,
        Ok(None) => {
            info!(requested_path = %key, "file not found");
            return Err(ApiError::not_found(&key));
        }
        Err(e) => return Err(ApiError::internal(e, &key)),
    };

    let content_type = object
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or(HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_name(&filename, &state.default_extension)
    );
    let disposition =
        HeaderValue::from_str(&disposition).map_err(|e| ApiError::internal(e, &key))?;

    info!(requested_path = %key, bytes = object.data.len(), "serving file");
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL)),
        ],
        Body::from(object.data),
    )
        .into_response())
}

async fn list_entries(
    State(state): State<AppState>,
    Path((owner_id, filename)): Path<(String, String)>,
) -> Result<Json<EntriesBody>, ApiError> {
    let key = object_key(&owner_id, &filename);

    match state.service.entry_names(&key).await {
        Ok(Some(entries)) => Ok(Json(EntriesBody {
            success: true,
            requested_path: key,
            entries,
        })),
        Ok(None) => Err(ApiError::not_found(&key)),
        Err(e) => Err(ApiError::internal(e, &key)),
    }
}

async fn get_entry(
    State(state): State<AppState>,
    Path((owner_id, filename, entry)): Path<(String, String, String)>,
    Query(query): Query<EntryQuery>,
) -> Result<Response, ApiError> {
    let key = object_key(&owner_id, &filename);

    let (data, truncated) = match state.service.read_entry(&key, &entry).await {
        Ok(EntryLookup::Found { data, truncated }) => (data, truncated),
        Ok(EntryLookup::ObjectNotFound) => return Err(ApiError::not_found(&key).with_entry(&entry)),
        Ok(EntryLookup::EntryNotFound) => {
            return Err(
                ApiError::new(StatusCode::NOT_FOUND, "Entry not found", &key).with_entry(&entry)
            );
        }
        Err(e) => return Err(ApiError::internal(e, &key).with_entry(&entry)),
    };

    if truncated {
        debug!(requested_path = %key, entry = %entry, "serving truncated entry");
    }

    let mut response = if query.format.as_deref() == Some("json") {
        match recover(&data) {
            Ok(value) => Json(value).into_response(),
            Err(e) => {
                warn!(requested_path = %key, entry = %entry, error = %e, "structured recovery failed");
                return Err(
                    ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string(), &key)
                        .with_entry(&entry),
                );
            }
        }
    } else {
        (
            [(header::CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE))],
            Body::from(data),
        )
            .into_response()
    };

    if truncated {
        response
            .headers_mut()
            .insert(TRUNCATED_HEADER, HeaderValue::from_static("true"));
    }
    Ok(response)
}

/// Download name for `filename`, with `.{extension}` appended if missing
pub fn attachment_name(filename: &str, extension: &str) -> String {
    let name: String = filename.chars().filter(|c| *c != '"' && !c.is_control()).collect();
    let suffix = format!(".{extension}");
    if extension.is_empty() || name.ends_with(&suffix) {
        name
    } else {
        format!("{name}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_name() {
        assert_eq!(attachment_name("report", "tar.gz"), "report.tar.gz");
        assert_eq!(attachment_name("report.tar.gz", "tar.gz"), "report.tar.gz");
        assert_eq!(attachment_name("we\"ird", "tar.gz"), "weird.tar.gz");
        assert_eq!(attachment_name("raw", ""), "raw");
    }

    #[test]
    fn test_error_body_shape() {
        let body = ApiError::not_found("u1-report").body;
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "error": "File not found",
                "requestedPath": "u1-report"
            })
        );
    }
}
