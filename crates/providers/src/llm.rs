use crate::config::GeminiConfig;
use crate::extract::first_json_object;
use aarogya_common::{IntakeError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends a prompt and returns the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Runs a completion and extracts the first JSON object from the reply.
/// Model output routinely wraps the JSON in prose or markdown fences.
pub async fn complete_json(llm: &dyn LanguageModel, prompt: &str) -> Result<Value> {
    let raw = llm.complete(prompt).await?;
    first_json_object(&raw)
}

pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| IntakeError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("sending {} char prompt to {}", prompt.len(), self.config.model);

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base, self.config.model
        );
        let body = json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }]
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.config.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| IntakeError::Adapter(format!("completion request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("completion API error ({}): {}", status, body);
            return Err(IntakeError::Adapter(format!(
                "completion API error ({status}): {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| IntakeError::Adapter(format!("failed to parse completion response: {e}")))?;

        extract_completion_text(&payload)
    }
}

fn extract_completion_text(payload: &Value) -> Result<String> {
    let text = payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    if text.is_empty() {
        return Err(IntakeError::Adapter(
            "completion returned no text".to_string(),
        ));
    }
    Ok(text)
}

pub fn create_language_model(config: &GeminiConfig) -> Result<Arc<dyn LanguageModel>> {
    Ok(Arc::new(GeminiClient::new(config.clone())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_completion_text() {
        let payload = json!({
            "candidates": [{
                "content": {"parts": [{"text": "  Hello there.  "}]}
            }]
        });
        assert_eq!(extract_completion_text(&payload).unwrap(), "Hello there.");
    }

    #[test]
    fn test_extract_completion_text_missing_candidates() {
        assert!(extract_completion_text(&json!({})).is_err());
        assert!(extract_completion_text(&json!({"candidates": []})).is_err());
    }

    #[tokio::test]
    async fn test_complete_json_strips_fences() {
        let mut mock = MockLanguageModel::new();
        mock.expect_complete()
            .returning(|_| Ok("```json\n{\"complete\": false}\n```".to_string()));

        let value = complete_json(&mock, "anything").await.unwrap();
        assert_eq!(value, json!({"complete": false}));
    }
}
