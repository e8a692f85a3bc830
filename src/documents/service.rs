//! Document service coordinating storage, model calls, and PDF rendering.

use crate::{
    config::Config,
    documents::{
        decode::decode_text,
        types::{DocumentError, HealthSnapshot, UploadedFile},
    },
    metrics::{MetricsSnapshot, ServiceMetrics},
    model::{GenerativeModel, get_model_client},
    pdf::SummaryPdf,
    store::{FallbackStore, MongoStore},
};
use std::sync::Arc;

/// Returned when the model answers a question without any text.
pub const ANSWER_PLACEHOLDER: &str = "Answer not available";
/// Rendered when the model returns an empty summary.
pub const SUMMARY_PLACEHOLDER: &str = "Unable to generate summary";
/// Instruction sent after the document text when requesting a summary.
pub const SUMMARY_INSTRUCTION: &str = "Provide a summary of the content.";

/// Runs the three user-facing operations: upload, ask, and summarize.
///
/// The store and model client are injected so the HTTP layer can be exercised against test
/// doubles. Build the service once near process start and share it through an `Arc`.
pub struct DocumentService {
    store: Arc<FallbackStore>,
    model: Arc<dyn GenerativeModel>,
    metrics: ServiceMetrics,
}

impl DocumentService {
    /// Assemble a service from its collaborators.
    pub fn new(store: Arc<FallbackStore>, model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            store,
            model,
            metrics: ServiceMetrics::new(),
        }
    }

    /// Build the production store and model client from configuration.
    ///
    /// Missing or unusable database settings fall back to memory-only storage; a missing API
    /// key yields a model client that reports itself unavailable. Neither aborts startup.
    pub async fn from_config(config: &Config) -> Self {
        let store = match &config.database {
            Some(settings) => match MongoStore::connect(settings).await {
                Ok(primary) => FallbackStore::new(Arc::new(primary)),
                Err(error) => {
                    tracing::warn!(error = %error, "MongoDB unavailable, documents will be kept in memory");
                    FallbackStore::memory_only()
                }
            },
            None => {
                tracing::warn!("MongoDB settings incomplete, documents will be kept in memory");
                FallbackStore::memory_only()
            }
        };
        let model = get_model_client(&config.model);
        Self::new(Arc::new(store), model)
    }

    /// Decode and persist an uploaded file, returning its document id.
    pub async fn upload(&self, file: UploadedFile) -> Result<String, DocumentError> {
        match file.filename.as_deref() {
            None => return Err(DocumentError::MissingFile),
            Some("") => return Err(DocumentError::EmptyFilename),
            Some(_) => {}
        }

        let (text, encoding) = decode_text(&file.bytes);
        let stored = self.store.store(&text).await;
        self.metrics.record_upload(stored.durable);
        tracing::info!(
            doc_id = %stored.id,
            bytes = file.bytes.len(),
            encoding = ?encoding,
            durable = stored.durable,
            "Document uploaded"
        );
        Ok(stored.id)
    }

    /// Answer `question` using the stored document as context.
    pub async fn ask(&self, doc_id: &str, question: &str) -> Result<String, DocumentError> {
        let context = self.load(doc_id).await?;

        tracing::info!(doc_id, question, "Calling Gemini API with question");
        let answer = self
            .model
            .generate(vec![context, question.to_string()])
            .await
            .inspect_err(|error| tracing::error!(doc_id, error = %error, "Gemini API error"))?;

        self.metrics.record_answer();
        Ok(non_empty_or(answer, ANSWER_PLACEHOLDER))
    }

    /// Summarize the stored document and render the summary as a PDF file.
    pub async fn summarize(&self, doc_id: &str) -> Result<SummaryPdf, DocumentError> {
        self.ensure_model_available()?;
        let text = self.load(doc_id).await?;

        tracing::info!(doc_id, "Calling Gemini API for summary generation");
        let summary = self
            .model
            .generate(vec![text, SUMMARY_INSTRUCTION.to_string()])
            .await
            .inspect_err(|error| {
                tracing::error!(doc_id, error = %error, "Gemini API error in summary");
            })?;
        let summary = non_empty_or(summary, SUMMARY_PLACEHOLDER);
        tracing::info!(doc_id, characters = summary.len(), "Summary generated");

        let pdf = tokio::task::spawn_blocking(move || SummaryPdf::render(&summary)).await??;
        self.metrics.record_summary();
        Ok(pdf)
    }

    /// Fail fast with [`DocumentError::ModelUnavailable`] when no model can serve requests.
    pub fn ensure_model_available(&self) -> Result<(), DocumentError> {
        if self.model.is_available() {
            Ok(())
        } else {
            Err(DocumentError::ModelUnavailable)
        }
    }

    /// Report store mode, model availability, and how many documents live only in memory.
    pub async fn health(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: "ok",
            store: self.store.mode(),
            model_available: self.model.is_available(),
            in_memory_documents: self.store.in_memory_documents().await,
        }
    }

    /// Retrieve the current metrics snapshot for diagnostics.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn load(&self, doc_id: &str) -> Result<String, DocumentError> {
        self.store.load(doc_id).await.ok_or_else(|| {
            tracing::error!(doc_id, "Document not found");
            DocumentError::NotFound {
                doc_id: doc_id.to_string(),
            }
        })
    }
}

fn non_empty_or(text: Option<String>, placeholder: &str) -> String {
    text.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}
