use crate::audio::validate_recording;
use crate::config::DwaniConfig;
use aarogya_common::{IntakeError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8], language: &str) -> Result<String>;
}

pub struct DwaniAsr {
    config: DwaniConfig,
    client: reqwest::Client,
}

impl DwaniAsr {
    pub fn new(config: DwaniConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| IntakeError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl SpeechToText for DwaniAsr {
    async fn transcribe(&self, audio: &[u8], language: &str) -> Result<String> {
        debug!("transcribing {} bytes in {}", audio.len(), language);

        // Local pre-flight before any network round trip.
        validate_recording(audio)?;

        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(audio.to_vec())
                .file_name("audio.wav")
                .mime_str("audio/wav")
                .map_err(|e| IntakeError::Internal(format!("invalid mime type: {e}")))?,
        );

        let url = format!("{}/v1/transcribe", self.config.api_base);
        let response = self
            .client
            .post(&url)
            .query(&[("language", language)])
            .header("X-API-Key", &self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| IntakeError::Adapter(format!("transcription request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IntakeError::Adapter(format!(
                "transcription API error ({status}): {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| IntakeError::Adapter(format!("failed to parse transcription response: {e}")))?;

        let text = normalize_transcription(&payload)?;
        info!("transcription completed: '{}'", text);
        Ok(text)
    }
}

/// Providers have shipped the transcript under several field names; this
/// is the one place shape differences are absorbed.
fn normalize_transcription(payload: &Value) -> Result<String> {
    let text = payload
        .as_str()
        .or_else(|| payload.get("text").and_then(Value::as_str))
        .or_else(|| payload.get("transcription").and_then(Value::as_str))
        .unwrap_or_default()
        .trim()
        .to_string();

    if text.is_empty() {
        return Err(IntakeError::Adapter(
            "transcription returned empty; the audio might be unclear or too short".to_string(),
        ));
    }
    Ok(text)
}

pub fn create_asr_service(config: &DwaniConfig) -> Result<Arc<dyn SpeechToText>> {
    Ok(Arc::new(DwaniAsr::new(config.clone())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_transcription_shapes() {
        assert_eq!(normalize_transcription(&json!("  hello ")).unwrap(), "hello");
        assert_eq!(normalize_transcription(&json!({"text": "hi"})).unwrap(), "hi");
        assert_eq!(
            normalize_transcription(&json!({"transcription": "namaste"})).unwrap(),
            "namaste"
        );
    }

    #[test]
    fn test_normalize_empty_is_error() {
        assert!(normalize_transcription(&json!({"text": "  "})).is_err());
        assert!(normalize_transcription(&json!({})).is_err());
    }

    #[tokio::test]
    async fn test_tiny_upload_never_reaches_the_network() {
        // Unroutable base URL: the pre-flight check must fail first.
        let config = DwaniConfig::default()
            .with_api_key("k".to_string())
            .with_api_base("http://invalid.localdomain".to_string());
        let asr = DwaniAsr::new(config).unwrap();

        let err = asr.transcribe(&[0u8; 64], "kannada").await.unwrap_err();
        assert!(matches!(err, IntakeError::ClientInput(_)));
    }
}
