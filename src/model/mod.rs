//! Generative model abstraction.
//!
//! The document service only needs one capability from a model: turn a list of prompt parts
//! (document text, question or instruction) into text. [`GeminiClient`] provides it over the
//! Gemini REST API; [`UnconfiguredModel`] stands in when no API key is configured so the server
//! can still start and accept uploads.

pub mod gemini;

pub use gemini::GeminiClient;

use crate::config::ModelSettings;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced while generating text.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No client is configured.
    #[error("Gemini API client not initialized")]
    Unavailable,
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider returned an error response.
    #[error("Gemini returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider refused to answer the prompt.
    #[error("Prompt blocked: {0}")]
    Blocked(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by text generation backends.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Send `parts` as a single user turn and return the generated text.
    ///
    /// `Ok(None)` means the model answered without any text.
    async fn generate(&self, parts: Vec<String>) -> Result<Option<String>, ModelError>;

    /// Whether the backend is able to serve requests at all.
    fn is_available(&self) -> bool {
        true
    }
}

/// Placeholder used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredModel;

#[async_trait]
impl GenerativeModel for UnconfiguredModel {
    async fn generate(&self, _parts: Vec<String>) -> Result<Option<String>, ModelError> {
        Err(ModelError::Unavailable)
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Build a model client based on configuration.
pub fn get_model_client(settings: &ModelSettings) -> Arc<dyn GenerativeModel> {
    let Some(api_key) = settings.api_key.as_deref() else {
        tracing::warn!("GEMINI_API_KEY not set; question answering and summaries are disabled");
        return Arc::new(UnconfiguredModel);
    };

    match GeminiClient::new(&settings.base_url, &settings.model, api_key) {
        Ok(client) => {
            tracing::info!(model = %settings.model, "Gemini client initialized");
            Arc::new(client)
        }
        Err(error) => {
            tracing::error!(error = %error, "Error configuring Gemini API");
            Arc::new(UnconfiguredModel)
        }
    }
}
