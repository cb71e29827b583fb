use crate::config::DwaniConfig;
use aarogya_common::{IntakeError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extracts the text content of an uploaded document, translated into
    /// the requested language.
    async fn extract(&self, document: &[u8], file_name: &str, language: &str) -> Result<String>;
}

pub struct DwaniDocuments {
    config: DwaniConfig,
    client: reqwest::Client,
}

impl DwaniDocuments {
    pub fn new(config: DwaniConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| IntakeError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }
}

fn check_extension(file_name: &str) -> Result<()> {
    let extension = file_name
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(IntakeError::ClientInput(format!(
            "unsupported document type '{file_name}'; allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

#[async_trait]
impl DocumentExtractor for DwaniDocuments {
    async fn extract(&self, document: &[u8], file_name: &str, language: &str) -> Result<String> {
        if document.is_empty() {
            return Err(IntakeError::ClientInput("empty document upload".to_string()));
        }
        check_extension(file_name)?;

        debug!("extracting {} ({} bytes) in {}", file_name, document.len(), language);

        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(document.to_vec())
                .file_name(file_name.to_string()),
        );

        let url = format!("{}/v1/extract-text", self.config.api_base);
        let response = self
            .client
            .post(&url)
            .query(&[("language", language)])
            .header("X-API-Key", &self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| IntakeError::Adapter(format!("document extraction request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IntakeError::Adapter(format!(
                "document extraction API error ({status}): {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| IntakeError::Adapter(format!("failed to parse extraction response: {e}")))?;

        let text = payload
            .get("extracted_text")
            .or_else(|| payload.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(IntakeError::Adapter(
                "document extraction returned no text".to_string(),
            ));
        }

        info!("extracted {} chars from {}", text.len(), file_name);
        Ok(text)
    }
}

pub fn create_document_extractor(config: &DwaniConfig) -> Result<Arc<dyn DocumentExtractor>> {
    Ok(Arc::new(DwaniDocuments::new(config.clone())?))
}
