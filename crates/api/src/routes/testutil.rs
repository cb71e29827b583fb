//! Stub adapters and app construction shared by the route tests.

use crate::routes::create_routes;
use crate::AppState;
use aarogya_common::{FinalSummary, IntakeError, Result};
use aarogya_core::{Assistant, InMemorySessionStore, IntakeOrchestrator, SpecialtyRouter};
use aarogya_providers::asr::SpeechToText;
use aarogya_providers::docs::DocumentExtractor;
use aarogya_providers::llm::LanguageModel;
use aarogya_providers::translate::Translator;
use aarogya_providers::tts::TextToSpeech;
use aarogya_providers::vision::VisionCaptioner;
use aarogya_rpc::RecordsStore;
use async_trait::async_trait;
use axum::Router;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub(crate) struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedLlm {
    pub(crate) fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| IntakeError::Adapter("script exhausted".to_string()))
    }
}

struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(&self, text: &str, _src: &str, _tgt: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

struct FixedAsr;

#[async_trait]
impl SpeechToText for FixedAsr {
    async fn transcribe(&self, _audio: &[u8], _language: &str) -> Result<String> {
        Ok("I have a fever".to_string())
    }
}

struct SilentTts;

#[async_trait]
impl TextToSpeech for SilentTts {
    async fn synthesize(&self, _text: &str, _language: &str) -> Result<Vec<u8>> {
        Ok(vec![0xff, 0xfb, 0x90])
    }
}

struct StubDocs;

#[async_trait]
impl DocumentExtractor for StubDocs {
    async fn extract(&self, _document: &[u8], _file_name: &str, _language: &str) -> Result<String> {
        Ok("Blood report: all values normal.".to_string())
    }
}

struct StubVision;

#[async_trait]
impl VisionCaptioner for StubVision {
    async fn caption(&self, _image: &[u8], _file_name: &str) -> Result<String> {
        Ok("A scanned medical report.".to_string())
    }
}

struct DiscardingStore;

#[async_trait]
impl RecordsStore for DiscardingStore {
    async fn persist_summary(&self, _summary: &FinalSummary) -> Result<()> {
        Ok(())
    }
}

/// Builds the full route tree over stub adapters, with the language model
/// replaying the given completions in order.
pub(crate) fn app_with_llm(replies: Vec<String>) -> Router {
    let llm: Arc<dyn LanguageModel> = Arc::new(ScriptedLlm::new(replies));
    let translator: Arc<dyn Translator> = Arc::new(IdentityTranslator);
    let asr: Arc<dyn SpeechToText> = Arc::new(FixedAsr);
    let tts: Arc<dyn TextToSpeech> = Arc::new(SilentTts);

    let orchestrator = IntakeOrchestrator::new(
        llm.clone(),
        translator.clone(),
        asr.clone(),
        tts,
        Arc::new(DiscardingStore),
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        assistant: Arc::new(Assistant::new(
            llm.clone(),
            Arc::new(InMemorySessionStore::new()),
        )),
        specialty: Arc::new(SpecialtyRouter::new(llm)),
        asr,
        translator,
        docs: Arc::new(StubDocs),
        vision: Arc::new(StubVision),
    };

    create_routes(Arc::new(state))
}
