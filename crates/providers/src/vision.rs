use crate::config::DwaniConfig;
use aarogya_common::{IntakeError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Fixed query used for intake uploads; patients send photographed
/// reports and prescriptions, not general imagery.
const CAPTION_QUERY: &str = "Describe this document";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisionCaptioner: Send + Sync {
    /// Produces a one-paragraph description of an uploaded image.
    async fn caption(&self, image: &[u8], file_name: &str) -> Result<String>;
}

pub struct DwaniVision {
    config: DwaniConfig,
    client: reqwest::Client,
}

impl DwaniVision {
    pub fn new(config: DwaniConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| IntakeError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl VisionCaptioner for DwaniVision {
    async fn caption(&self, image: &[u8], file_name: &str) -> Result<String> {
        if image.is_empty() {
            return Err(IntakeError::ClientInput("empty image upload".to_string()));
        }

        debug!("captioning {} ({} bytes)", file_name, image.len());

        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(image.to_vec()).file_name(file_name.to_string()),
        );

        let url = format!("{}/v1/caption", self.config.api_base);
        let response = self
            .client
            .post(&url)
            .query(&[("query", CAPTION_QUERY), ("src_lang", "english")])
            .header("X-API-Key", &self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| IntakeError::Adapter(format!("caption request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IntakeError::Adapter(format!(
                "caption API error ({status}): {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| IntakeError::Adapter(format!("failed to parse caption response: {e}")))?;

        let caption = normalize_caption(&payload)?;
        info!("captioned {}", file_name);
        Ok(caption)
    }
}

/// The vision provider has shipped the caption under several field names.
fn normalize_caption(payload: &Value) -> Result<String> {
    let caption = payload
        .as_str()
        .or_else(|| payload.get("caption").and_then(Value::as_str))
        .or_else(|| payload.get("description").and_then(Value::as_str))
        .or_else(|| payload.get("answer").and_then(Value::as_str))
        .unwrap_or_default()
        .trim()
        .to_string();

    if caption.is_empty() {
        return Err(IntakeError::Adapter(
            "caption response carried no text".to_string(),
        ));
    }
    Ok(caption)
}

pub fn create_vision_captioner(config: &DwaniConfig) -> Result<Arc<dyn VisionCaptioner>> {
    Ok(Arc::new(DwaniVision::new(config.clone())?))
}
