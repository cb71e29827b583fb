pub mod asr;
pub mod audio;
pub mod config;
pub mod docs;
pub mod extract;
pub mod llm;
pub mod translate;
pub mod tts;
pub mod vision;

pub use asr::{create_asr_service, DwaniAsr, SpeechToText};
pub use config::{DwaniConfig, GeminiConfig};
pub use docs::{create_document_extractor, DocumentExtractor, DwaniDocuments};
pub use llm::{create_language_model, GeminiClient, LanguageModel};
pub use translate::{create_translator, DwaniTranslate, Translator};
pub use tts::{create_tts_service, DwaniTts, TextToSpeech};
pub use vision::{create_vision_captioner, DwaniVision, VisionCaptioner};
