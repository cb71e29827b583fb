use serde::{Deserialize, Serialize};

/// Connection settings for the Dwani speech/translation/vision API.
/// The key always comes from the environment; it is never compiled in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DwaniConfig {
    pub api_key: String,
    pub api_base: String,
    pub timeout_seconds: u64,
    /// Default transcription language when the request carries none.
    pub default_language: String,
}

impl Default for DwaniConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(), // Must be provided by user
            api_base: "https://dwani-dwani-api.hf.space".to_string(),
            timeout_seconds: 60,
            default_language: "kannada".to_string(),
        }
    }
}

impl DwaniConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("DWANI_API_KEY") {
            config.api_key = key;
        }
        if let Ok(base) = std::env::var("DWANI_API_BASE") {
            config.api_base = base;
        }
        config
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("Dwani API key is required".to_string());
        }
        if self.api_base.is_empty() {
            return Err("Dwani API base URL is required".to_string());
        }
        Ok(())
    }
}

/// Connection settings for the Gemini completion API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(), // Must be provided by user
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.api_key = key;
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.model = model;
        }
        config
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("Gemini API key is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let dwani = DwaniConfig::default();
        assert!(dwani.api_key.is_empty());
        assert_eq!(dwani.default_language, "kannada");
        assert!(dwani.validate().is_err());

        let gemini = GeminiConfig::default();
        assert_eq!(gemini.model, "gemini-1.5-flash");
        assert!(gemini.validate().is_err());
    }

    #[test]
    fn test_config_builders() {
        let dwani = DwaniConfig::default()
            .with_api_key("test-key".to_string())
            .with_api_base("http://localhost:9000".to_string());
        assert!(dwani.validate().is_ok());

        let gemini = GeminiConfig::default()
            .with_api_key("test-key".to_string())
            .with_model("gemini-1.5-pro".to_string());
        assert!(gemini.validate().is_ok());
        assert_eq!(gemini.model, "gemini-1.5-pro");
    }
}
