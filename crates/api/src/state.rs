use aarogya_core::{Assistant, IntakeOrchestrator, SpecialtyRouter};
use aarogya_providers::asr::SpeechToText;
use aarogya_providers::docs::DocumentExtractor;
use aarogya_providers::translate::Translator;
use aarogya_providers::vision::VisionCaptioner;
use std::sync::Arc;

/// Everything the route handlers need, shared across requests. The
/// orchestrator drives the intake flow; the raw adapters back the
/// standalone speech and document endpoints.
pub struct AppState {
    pub orchestrator: Arc<IntakeOrchestrator>,
    pub assistant: Arc<Assistant>,
    pub specialty: Arc<SpecialtyRouter>,
    pub asr: Arc<dyn SpeechToText>,
    pub translator: Arc<dyn Translator>,
    pub docs: Arc<dyn DocumentExtractor>,
    pub vision: Arc<dyn VisionCaptioner>,
}
