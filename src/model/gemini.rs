//! Gemini `generateContent` client.

use super::{GenerativeModel, ModelError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const USER_AGENT: &str = "docqa/0.1";

/// Thin REST client for a single Gemini model.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Construct a client for `model` served from `base_url`.
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Result<Self, ModelError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: sanitize_model(model),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Accept both `gemini-x` and `models/gemini-x`.
fn sanitize_model(model: &str) -> String {
    model.trim().trim_start_matches("models/").to_string()
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback", default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason", default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<Option<String>, ModelError> {
        if self.candidates.is_empty() {
            if let Some(reason) = self.prompt_feedback.and_then(|feedback| feedback.block_reason) {
                return Err(ModelError::Blocked(reason));
            }
            return Ok(None);
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Some(text).filter(|text| !text.is_empty()))
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, parts: Vec<String>) -> Result<Option<String>, ModelError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: parts
                    .into_iter()
                    .map(|text| Part { text: Some(text) })
                    .collect(),
            }],
        };

        tracing::debug!(model = %self.model, "Calling Gemini generateContent");
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::UnexpectedStatus { status, body });
        }

        let body: GenerateContentResponse = response.json().await.map_err(|error| {
            ModelError::InvalidResponse(format!("failed to decode Gemini response: {error}"))
        })?;

        body.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(&server.base_url(), "models/gemini-test", "test-key").expect("client")
    }

    #[tokio::test]
    async fn sends_parts_as_one_user_turn() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/gemini-test:generateContent")
                    .header("x-goog-api-key", "test-key")
                    .json_body(json!({
                        "contents": [{
                            "role": "user",
                            "parts": [
                                { "text": "The sky is blue." },
                                { "text": "What color is the sky?" }
                            ]
                        }]
                    }));
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": {
                            "role": "model",
                            "parts": [{ "text": "Blue" }, { "text": "." }]
                        },
                        "finishReason": "STOP"
                    }]
                }));
            })
            .await;

        let answer = client_for(&server)
            .generate(vec![
                "The sky is blue.".into(),
                "What color is the sky?".into(),
            ])
            .await
            .expect("answer");

        mock.assert_async().await;
        assert_eq!(answer.as_deref(), Some("Blue."));
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/gemini-test:generateContent");
                then.status(403).body("API key not valid");
            })
            .await;

        let error = client_for(&server)
            .generate(vec!["text".into()])
            .await
            .expect_err("error response");

        assert!(
            matches!(&error, ModelError::UnexpectedStatus { status, body } if status.as_u16() == 403 && body.contains("not valid"))
        );
    }

    #[tokio::test]
    async fn empty_candidate_yields_no_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/gemini-test:generateContent");
                then.status(200).json_body(json!({
                    "candidates": [{ "content": { "parts": [] }, "finishReason": "MAX_TOKENS" }]
                }));
            })
            .await;

        let answer = client_for(&server)
            .generate(vec!["text".into()])
            .await
            .expect("response");
        assert_eq!(answer, None);
    }

    #[tokio::test]
    async fn blocked_prompt_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/gemini-test:generateContent");
                then.status(200).json_body(json!({
                    "promptFeedback": { "blockReason": "SAFETY" }
                }));
            })
            .await;

        let error = client_for(&server)
            .generate(vec!["text".into()])
            .await
            .expect_err("blocked");
        assert!(matches!(error, ModelError::Blocked(reason) if reason == "SAFETY"));
    }
}
