//! Request inputs, reports, and errors for the document service.

use crate::{model::ModelError, pdf::PdfError, store::StoreMode};
use serde::Serialize;
use thiserror::Error;

/// Errors emitted by the document service. Each variant maps to one HTTP status.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Upload carried no `file` field.
    #[error("No file provided")]
    MissingFile,
    /// Upload carried a `file` field with an empty filename.
    #[error("No file selected")]
    EmptyFilename,
    /// Upload body could not be read.
    #[error("Failed to upload document: {0}")]
    Upload(String),
    /// Request body was missing required fields or could not be parsed.
    #[error("{0}")]
    InvalidRequest(String),
    /// Identifier is unknown to both the primary and the fallback store.
    #[error("Document not found")]
    NotFound {
        /// Identifier that was looked up.
        doc_id: String,
    },
    /// No model client is configured.
    #[error("Gemini API client not initialized")]
    ModelUnavailable,
    /// The model call failed.
    #[error("Gemini API error: {0}")]
    Model(#[from] ModelError),
    /// The summary could not be rendered or streamed.
    #[error("Failed to download summary: {0}")]
    Render(#[from] PdfError),
    /// Background rendering task panicked or was cancelled.
    #[error("Failed to download summary: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A file received through `/upload`.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename, if any.
    pub filename: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Readiness report returned by `GET /health`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthSnapshot {
    /// Always `"ok"` while the process is serving requests.
    pub status: &'static str,
    /// Which storage backends are configured.
    pub store: StoreMode,
    /// Whether the model client can serve requests.
    pub model_available: bool,
    /// Documents currently kept in the in-memory fallback.
    pub in_memory_documents: usize,
}
