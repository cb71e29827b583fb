use crate::config::DwaniConfig;
use aarogya_common::{is_english, IntakeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, src_lang: &str, tgt_lang: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    sentences: Vec<&'a str>,
    src_lang: &'a str,
    tgt_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<String>,
}

pub struct DwaniTranslate {
    config: DwaniConfig,
    client: reqwest::Client,
}

impl DwaniTranslate {
    pub fn new(config: DwaniConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| IntakeError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Translator for DwaniTranslate {
    async fn translate(&self, text: &str, src_lang: &str, tgt_lang: &str) -> Result<String> {
        // Identity cases: nothing to translate, or target already matches.
        if text.trim().is_empty() || tgt_lang.trim().is_empty() {
            return Ok(text.to_string());
        }
        if is_english(tgt_lang) && is_english(src_lang) {
            return Ok(text.to_string());
        }
        if src_lang.eq_ignore_ascii_case(tgt_lang) {
            return Ok(text.to_string());
        }

        debug!("translating {} -> {}: '{}'", src_lang, tgt_lang, text);

        let url = format!("{}/v1/translate", self.config.api_base);
        let request = TranslateRequest {
            sentences: vec![text],
            src_lang,
            tgt_lang,
        };

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| IntakeError::Adapter(format!("translation request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IntakeError::Adapter(format!(
                "translation API error ({status}): {body}"
            )));
        }

        let payload: TranslateResponse = response
            .json()
            .await
            .map_err(|e| IntakeError::Adapter(format!("failed to parse translation response: {e}")))?;

        payload
            .translations
            .into_iter()
            .next()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| IntakeError::Adapter("translation returned no sentences".to_string()))
    }
}

/// Best-effort translation into the patient's language. User-facing turns
/// must never fail because the translator is down, so any error falls back
/// to the original English text.
pub async fn translate_or_original(
    translator: &dyn Translator,
    text: &str,
    target_language: &str,
) -> String {
    if is_english(target_language) {
        return text.to_string();
    }
    match translator.translate(text, "english", target_language).await {
        Ok(translated) => translated,
        Err(e) => {
            warn!("translation failed, falling back to original text: {}", e);
            text.to_string()
        }
    }
}

pub fn create_translator(config: &DwaniConfig) -> Result<Arc<dyn Translator>> {
    Ok(Arc::new(DwaniTranslate::new(config.clone())?))
}
