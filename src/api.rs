//! HTTP surface for docqa.
//!
//! - `POST /upload` – Multipart upload (field `file`). The bytes are decoded as UTF-8, falling
//!   back to Latin-1, stored, and answered with `201 { "doc_id": ... }`.
//! - `POST /ask` – `{ "doc_id", "question" }` → `{ "answer" }` from the generative model.
//! - `POST /download_summary` – `{ "doc_id" }` → `summary.pdf` attachment.
//! - `GET /health` – Store mode, model availability, and in-memory document count.
//! - `GET /metrics` – Request counters since startup.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Every error is answered as `{ "error": message }`. CORS is permissive on all routes.

use crate::documents::{DocumentError, DocumentService, HealthSnapshot, UploadedFile};
use crate::metrics::MetricsSnapshot;
use axum::{
    Json, Router,
    body::Body,
    extract::{
        DefaultBodyLimit, Multipart, State, multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Largest accepted request body.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
const UPLOAD_FIELD: &str = "file";
const SUMMARY_FILENAME: &str = "summary.pdf";

/// Build the HTTP router exposing the document API surface.
pub fn create_router(service: Arc<DocumentService>) -> Router {
    Router::new()
        .route("/upload", post(upload_document))
        .route("/ask", post(ask_question))
        .route("/download_summary", post(download_summary))
        .route("/health", get(get_health))
        .route("/metrics", get(get_metrics))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Success response for `POST /upload`.
#[derive(Serialize)]
struct UploadResponse {
    doc_id: String,
}

/// Store an uploaded text file.
async fn upload_document(
    State(service): State<Arc<DocumentService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    // A non-multipart body simply has no file in it.
    let Ok(mut multipart) = multipart else {
        return Err(DocumentError::MissingFile.into());
    };

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| DocumentError::Upload(error.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|error| DocumentError::Upload(error.to_string()))?;
        upload = Some(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let file = upload.ok_or(DocumentError::MissingFile)?;
    let doc_id = service.upload(file).await?;
    Ok((StatusCode::CREATED, Json(UploadResponse { doc_id })))
}

/// Request body for `POST /ask`.
#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    doc_id: Option<String>,
    #[serde(default)]
    question: Option<String>,
}

/// Success response for `POST /ask`.
#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

/// Answer a question about a stored document.
async fn ask_question(
    State(service): State<Arc<DocumentService>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let Json(request) = payload.map_err(invalid_body)?;
    let (Some(doc_id), Some(question)) = (
        request.doc_id.filter(|value| !value.is_empty()),
        request.question.filter(|value| !value.is_empty()),
    ) else {
        return Err(DocumentError::InvalidRequest("Missing doc_id or question".into()).into());
    };

    let answer = service.ask(&doc_id, &question).await?;
    Ok(Json(AskResponse { answer }))
}

/// Request body for `POST /download_summary`.
#[derive(Deserialize)]
struct SummaryRequest {
    #[serde(default)]
    doc_id: Option<String>,
}

/// Summarize a stored document and stream the result as a PDF attachment.
async fn download_summary(
    State(service): State<Arc<DocumentService>>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    service.ensure_model_available()?;
    let Json(request) = payload.map_err(invalid_body)?;
    let doc_id = request
        .doc_id
        .filter(|value| !value.is_empty())
        .ok_or_else(|| DocumentError::InvalidRequest("Missing doc_id".into()))?;

    let pdf = service.summarize(&doc_id).await?;
    let length = pdf.len().await.map_err(DocumentError::from)?;
    let stream = pdf.into_stream().await.map_err(DocumentError::from)?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{SUMMARY_FILENAME}\""),
        ),
        (header::CONTENT_LENGTH, length.to_string()),
    ];
    Ok((headers, Body::from_stream(stream)).into_response())
}

/// Report store mode, model availability, and the in-memory document count.
async fn get_health(State(service): State<Arc<DocumentService>>) -> Json<HealthSnapshot> {
    Json(service.health().await)
}

/// Return request counters since startup.
async fn get_metrics(State(service): State<Arc<DocumentService>>) -> Json<MetricsSnapshot> {
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload",
                method: "POST",
                path: "/upload",
                description: "Upload a text file as multipart field `file`. Response returns { \"doc_id\": string } with status 201.",
                request_example: None,
            },
            CommandDescriptor {
                name: "ask",
                method: "POST",
                path: "/ask",
                description: "Ask a question about an uploaded document. Response returns { \"answer\": string }.",
                request_example: Some(json!({
                    "doc_id": "66f1c0ffee0000000000beef",
                    "question": "What color is the sky?"
                })),
            },
            CommandDescriptor {
                name: "download_summary",
                method: "POST",
                path: "/download_summary",
                description: "Summarize an uploaded document and download the summary as summary.pdf.",
                request_example: Some(json!({
                    "doc_id": "66f1c0ffee0000000000beef"
                })),
            },
            CommandDescriptor {
                name: "health",
                method: "GET",
                path: "/health",
                description: "Report whether documents are stored durably, whether the model is available, and how many documents live only in memory.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return upload, answer, and summary counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

fn invalid_body(rejection: JsonRejection) -> AppError {
    DocumentError::InvalidRequest(format!("Invalid request body: {}", rejection.body_text())).into()
}

struct AppError(DocumentError);

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            DocumentError::MissingFile
            | DocumentError::EmptyFilename
            | DocumentError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DocumentError::NotFound { .. } => StatusCode::NOT_FOUND,
            DocumentError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            DocumentError::Upload(_)
            | DocumentError::Model(_)
            | DocumentError::Render(_)
            | DocumentError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self.0, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "Request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<DocumentError> for AppError {
    fn from(inner: DocumentError) -> Self {
        Self(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commands_catalog_exposes_document_endpoints() {
        let response = get_commands().await;
        let commands = response.0.commands;
        for (name, path) in [
            ("upload", "/upload"),
            ("ask", "/ask"),
            ("download_summary", "/download_summary"),
        ] {
            let command = commands
                .iter()
                .find(|cmd| cmd.name == name)
                .unwrap_or_else(|| panic!("{name} command present"));
            assert_eq!(command.method, "POST");
            assert_eq!(command.path, path);
        }
    }

    #[test]
    fn errors_map_to_documented_statuses() {
        let cases = [
            (DocumentError::MissingFile, StatusCode::BAD_REQUEST),
            (DocumentError::EmptyFilename, StatusCode::BAD_REQUEST),
            (
                DocumentError::NotFound {
                    doc_id: "x".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (DocumentError::ModelUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (
                DocumentError::Model(crate::model::ModelError::Unavailable),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DocumentError::Upload("stream ended".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(AppError(error).status(), expected);
        }
    }
}
