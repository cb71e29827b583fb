use crate::error::{validation_error, ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{FromRequest, Multipart, Request, State},
    routing::post,
    Json, Router,
};
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const DEFAULT_SRC_LANG: &str = "kannada";
const DEFAULT_TGT_LANG: &str = "english";

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/transcribe", post(transcribe_multipart))
        .route("/api/transcribe", post(transcribe_base64))
        .route("/translate", post(translate))
        .with_state(state)
}

struct AudioUpload {
    audio: Vec<u8>,
    language: Option<String>,
}

async fn read_audio_upload(mut multipart: Multipart) -> ApiResult<AudioUpload> {
    let mut audio: Option<Vec<u8>> = None;
    let mut language: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| validation_error(&format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "audio" | "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| validation_error(&format!("failed to read audio field: {e}")))?;
                audio = Some(bytes.to_vec());
            }
            "language" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| validation_error(&format!("failed to read language field: {e}")))?;
                if !text.trim().is_empty() {
                    language = Some(text);
                }
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| validation_error("No audio file provided"))?;
    Ok(AudioUpload { audio, language })
}

async fn transcribe_multipart(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let upload = read_audio_upload(multipart).await?;
    let language = upload.language.as_deref().unwrap_or(DEFAULT_SRC_LANG);

    let transcription = state.asr.transcribe(&upload.audio, language).await?;
    info!("transcribed upload in {}", language);

    Ok(Json(json!({
        "success": true,
        "transcription": transcription,
        "language": language,
    })))
}

#[derive(Deserialize)]
struct Base64TranscribeRequest {
    audio_data: Option<String>,
    language: Option<String>,
    file_extension: Option<String>,
}

async fn transcribe_base64(
    State(state): State<Arc<AppState>>,
    Json(request): Json<Base64TranscribeRequest>,
) -> ApiResult<Json<Value>> {
    let encoded = request
        .audio_data
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| {
            validation_error("No audio data provided. Please include a base64 'audio_data' field.")
        })?;
    let language = request.language.as_deref().unwrap_or(DEFAULT_SRC_LANG);
    let extension = request.file_extension.as_deref().unwrap_or("wav");

    let audio = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| validation_error(&format!("invalid base64 audio data: {e}")))?;
    info!("decoded {} bytes of base64 .{} audio", audio.len(), extension);

    let transcription = state.asr.transcribe(&audio, language).await?;

    Ok(Json(json!({
        "success": true,
        "transcription": transcription,
        "language": language,
    })))
}

#[derive(Deserialize)]
struct TranslateRequest {
    sentences: Option<Vec<String>>,
    src_lang: Option<String>,
    tgt_lang: Option<String>,
}

/// Dual-mode endpoint: a JSON body translates sentences directly; a
/// multipart body is transcribed first and the transcript translated.
async fn translate(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> ApiResult<Json<Value>> {
    let content_type = request
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &()).await.map_err(|e| {
            validation_error(&format!("malformed multipart body: {e}"))
        })?;
        translate_audio(state, multipart).await
    } else if content_type.starts_with("application/json") {
        let Json(body): Json<TranslateRequest> =
            Json::from_request(request, &()).await.map_err(|e| {
                validation_error(&format!("invalid JSON body: {e}"))
            })?;
        translate_sentences(state, body).await
    } else {
        Err(ApiError::InvalidContentType)
    }
}

async fn translate_audio(state: Arc<AppState>, multipart: Multipart) -> ApiResult<Json<Value>> {
    let upload = read_audio_upload(multipart).await?;
    let src_lang = upload.language.as_deref().unwrap_or(DEFAULT_SRC_LANG);

    let transcription = state.asr.transcribe(&upload.audio, src_lang).await?;
    let translation = state
        .translator
        .translate(&transcription, src_lang, DEFAULT_TGT_LANG)
        .await?;

    Ok(Json(json!({
        "success": true,
        "transcription": transcription,
        "translation": translation,
        "src_lang": src_lang,
        "tgt_lang": DEFAULT_TGT_LANG,
    })))
}

async fn translate_sentences(
    state: Arc<AppState>,
    request: TranslateRequest,
) -> ApiResult<Json<Value>> {
    let sentences = request
        .sentences
        .filter(|s| !s.is_empty())
        .ok_or_else(|| validation_error("No sentences provided"))?;
    let src_lang = request.src_lang.unwrap_or_else(|| DEFAULT_SRC_LANG.to_string());
    let tgt_lang = request.tgt_lang.unwrap_or_else(|| DEFAULT_TGT_LANG.to_string());

    let mut translations = Vec::with_capacity(sentences.len());
    for sentence in &sentences {
        let translated = state
            .translator
            .translate(sentence, &src_lang, &tgt_lang)
            .await?;
        translations.push(translated);
    }

    Ok(Json(json!({
        "success": true,
        "translations": translations,
        "src_lang": src_lang,
        "tgt_lang": tgt_lang,
    })))
}
