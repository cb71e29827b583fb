use crate::config::DwaniConfig;
use aarogya_common::{IntakeError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Renders the given text as spoken audio (MPEG bytes).
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    input: &'a str,
    language: &'a str,
}

pub struct DwaniTts {
    config: DwaniConfig,
    client: reqwest::Client,
}

impl DwaniTts {
    pub fn new(config: DwaniConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| IntakeError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl TextToSpeech for DwaniTts {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(IntakeError::ClientInput(
                "cannot synthesize empty text".to_string(),
            ));
        }

        debug!("synthesizing {} chars in {}", text.len(), language);

        let url = format!("{}/v1/audio/speech", self.config.api_base);
        let request = SpeechRequest { input: text, language };

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| IntakeError::Adapter(format!("speech request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IntakeError::Adapter(format!(
                "speech API error ({status}): {body}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| IntakeError::Adapter(format!("failed to read speech audio: {e}")))?
            .to_vec();

        if audio.is_empty() {
            return Err(IntakeError::Adapter(
                "speech API returned no audio".to_string(),
            ));
        }

        info!("synthesized {} bytes of audio", audio.len());
        Ok(audio)
    }
}

pub fn create_tts_service(config: &DwaniConfig) -> Result<Arc<dyn TextToSpeech>> {
    Ok(Arc::new(DwaniTts::new(config.clone())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_text_is_rejected_locally() {
        let config = DwaniConfig::default()
            .with_api_key("k".to_string())
            .with_api_base("http://invalid.localdomain".to_string());
        let tts = DwaniTts::new(config).unwrap();

        let err = tts.synthesize("   ", "kannada").await.unwrap_err();
        assert!(matches!(err, IntakeError::ClientInput(_)));
    }
}
