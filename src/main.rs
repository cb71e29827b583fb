use aarogya_api::{ApiConfig, ApiServer, AppState};
use aarogya_core::{Assistant, InMemorySessionStore, IntakeOrchestrator, SpecialtyRouter};
use aarogya_providers::{
    create_asr_service, create_document_extractor, create_language_model, create_translator,
    create_tts_service, create_vision_captioner, DwaniConfig, GeminiConfig,
};
use aarogya_rpc::{spawn_records_process, NoopRecordsStore, RecordsClient, RecordsStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aarogya=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Aarogya intake API...");

    // Load environment variables
    dotenv::dotenv().ok();

    let dwani_config = DwaniConfig::from_env();
    dwani_config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid Dwani configuration: {e}"))?;
    let gemini_config = GeminiConfig::from_env();
    gemini_config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid Gemini configuration: {e}"))?;

    let llm = create_language_model(&gemini_config)?;
    let translator = create_translator(&dwani_config)?;
    let asr = create_asr_service(&dwani_config)?;
    let tts = create_tts_service(&dwani_config)?;
    let docs = create_document_extractor(&dwani_config)?;
    let vision = create_vision_captioner(&dwani_config)?;

    // The records backend is optional: without it, summaries are logged
    // but not persisted.
    let records: Arc<dyn RecordsStore> = match std::env::var("RECORDS_RPC_CMD") {
        Ok(command) if !command.trim().is_empty() => {
            let client = spawn_records_process(&command)
                .map_err(|e| anyhow::anyhow!("failed to start records backend: {e}"))?;
            info!("Records backend connected");
            Arc::new(RecordsClient::new(client))
        }
        _ => {
            warn!("RECORDS_RPC_CMD not set; summaries will not be persisted");
            Arc::new(NoopRecordsStore)
        }
    };

    let orchestrator = IntakeOrchestrator::new(
        llm.clone(),
        translator.clone(),
        asr.clone(),
        tts,
        records,
    );
    let assistant = Assistant::new(llm.clone(), Arc::new(InMemorySessionStore::new()));
    let specialty = SpecialtyRouter::new(llm);

    let state = Arc::new(AppState {
        orchestrator: Arc::new(orchestrator),
        assistant: Arc::new(assistant),
        specialty: Arc::new(specialty),
        asr,
        translator,
        docs,
        vision,
    });

    let config = ApiConfig {
        port: std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080),
        ..ApiConfig::default()
    };

    let server = ApiServer::new(config, state);
    server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))?;

    Ok(())
}
