use crate::error::{validation_error, ApiResult};
use crate::AppState;
use aarogya_common::{ConversationEntry, ConversationState, IntakeTemplate};
use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/start", get(start_conversation))
        .route("/chat", post(chat_turn))
        .route("/vass", post(voice_turn))
        .with_state(state)
}

#[derive(Deserialize)]
struct StartQuery {
    language: Option<String>,
}

async fn start_conversation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StartQuery>,
) -> ApiResult<Json<Value>> {
    let language = query.language.unwrap_or_else(|| "english".to_string());
    let outcome = state.orchestrator.start(&language).await;

    Ok(Json(json!({
        "success": true,
        "template": outcome.state.template,
        "question": outcome.reply,
        "conversation_history": outcome.state.history,
    })))
}

#[derive(Deserialize)]
struct ChatRequest {
    template: Option<IntakeTemplate>,
    answer: Option<String>,
    #[serde(default)]
    conversation_history: Vec<ConversationEntry>,
    language: Option<String>,
}

async fn chat_turn(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<Value>> {
    let answer = request
        .answer
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| validation_error("No answer provided. Please send template and answer."))?;
    let language = request.language.unwrap_or_else(|| "english".to_string());

    let conversation = ConversationState {
        template: request.template.unwrap_or_else(IntakeTemplate::initial),
        history: request.conversation_history,
    };

    let outcome = state
        .orchestrator
        .text_turn(conversation, answer, &language)
        .await?;

    let mut body = json!({
        "success": true,
        "updated_template": outcome.state.template,
        "complete": outcome.complete,
        "conversation_history": outcome.state.history,
    });
    let reply_key = if outcome.complete { "message" } else { "next_question" };
    body[reply_key] = Value::String(outcome.reply);
    if let Some(summary) = outcome.final_summary {
        body["final_summary"] = serde_json::to_value(summary)
            .map_err(|e| crate::error::ApiError::Internal(e.to_string()))?;
    }

    Ok(Json(body))
}

/// Voice turn: audio in, audio out. The textual result travels in the
/// `X-Chat-Metadata` header so clients keep a transcript without
/// re-transcribing the reply audio.
async fn voice_turn(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut audio: Option<Vec<u8>> = None;
    let mut language = "english".to_string();
    let mut template: Option<IntakeTemplate> = None;
    let mut history: Vec<ConversationEntry> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| validation_error(&format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "file" | "audio" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| validation_error(&format!("failed to read audio field: {e}")))?;
                audio = Some(bytes.to_vec());
            }
            "language" => {
                language = field
                    .text()
                    .await
                    .map_err(|e| validation_error(&format!("failed to read language field: {e}")))?;
            }
            "template" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| validation_error(&format!("failed to read template field: {e}")))?;
                if !text.trim().is_empty() {
                    template = Some(
                        serde_json::from_str(&text)
                            .map_err(|e| validation_error(&format!("invalid template JSON: {e}")))?,
                    );
                }
            }
            "conversation_history" => {
                let text = field.text().await.map_err(|e| {
                    validation_error(&format!("failed to read conversation_history field: {e}"))
                })?;
                if !text.trim().is_empty() {
                    history = serde_json::from_str(&text).map_err(|e| {
                        validation_error(&format!("invalid conversation_history JSON: {e}"))
                    })?;
                }
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| validation_error("No audio file provided"))?;
    let conversation = ConversationState {
        template: template.unwrap_or_else(IntakeTemplate::initial),
        history,
    };

    let outcome = state
        .orchestrator
        .voice_turn(conversation, &audio, &language)
        .await?;

    let metadata = json!({
        "text_spoken": outcome.turn.reply,
        "transcription": outcome.transcribed,
        "updated_template": outcome.turn.state.template,
        "conversation_history": outcome.turn.state.history,
        "complete": outcome.turn.complete,
        "final_summary": outcome.turn.final_summary,
    });
    let metadata = serde_json::to_string(&metadata)
        .map_err(|e| crate::error::ApiError::Internal(e.to_string()))?;

    info!(
        "voice turn served: {} bytes of reply audio",
        outcome.audio.len()
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("audio/mpeg"),
    );
    headers.insert(
        "X-Chat-Metadata",
        HeaderValue::from_str(&metadata)
            .map_err(|e| crate::error::ApiError::Internal(e.to_string()))?,
    );

    Ok((headers, outcome.audio).into_response())
}

#[cfg(test)]
mod tests {
    use super::super::testutil::app_with_llm;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn template_with_name(name: &str) -> Value {
        json!({
            "name": name,
            "age": "number",
            "symptoms": [{"symptom": "string", "onset": "string", "severity": "string"}],
            "medical_history": {"conditions": ["string"], "allergies": ["string"]}
        })
    }

    #[tokio::test]
    async fn test_start_returns_greeting_and_fresh_state() {
        let app = app_with_llm(vec![]);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/start?language=english")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["conversation_history"].as_array().unwrap().len(), 1);
        assert_eq!(body["template"]["name"], json!("string"));
        assert!(body["question"].as_str().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn test_chat_without_answer_is_rejected() {
        let app = app_with_llm(vec![]);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"language": "english"}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_chat_turn_fills_template_and_asks_next() {
        let app = app_with_llm(vec![
            template_with_name("John").to_string(),
            json!({"complete": false, "question": "How old are you?"}).to_string(),
        ]);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"answer": "My name is John", "language": "english"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["complete"], json!(false));
        assert_eq!(body["updated_template"]["name"], json!("John"));
        assert_eq!(body["next_question"], json!("How old are you?"));
        assert!(body.get("final_summary").is_none());
    }

    #[tokio::test]
    async fn test_chat_completion_returns_final_summary() {
        let app = app_with_llm(vec![
            template_with_name("John").to_string(),
            json!({"complete": true, "message": "Thank you, we have everything."}).to_string(),
            json!({"name": "John", "summary": "Fever for two days."}).to_string(),
        ]);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"answer": "No other symptoms", "language": "english"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["complete"], json!(true));
        assert_eq!(body["message"], json!("Thank you, we have everything."));
        assert_eq!(body["final_summary"]["summary"], json!("Fever for two days."));
    }

    #[tokio::test]
    async fn test_vass_returns_audio_with_metadata_header() {
        let app = app_with_llm(vec![
            template_with_name("John").to_string(),
            json!({"complete": false, "question": "When did the fever start?"}).to_string(),
        ]);

        let boundary = "vassboundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"audio.wav\"\r\nContent-Type: audio/wav\r\n\r\nRIFFxxxx\r\n--{boundary}\r\nContent-Disposition: form-data; name=\"language\"\r\n\r\nenglish\r\n--{boundary}--\r\n"
        );
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/vass")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "audio/mpeg"
        );
        let metadata: Value = serde_json::from_str(
            response
                .headers()
                .get("X-Chat-Metadata")
                .unwrap()
                .to_str()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(metadata["text_spoken"], json!("When did the fever start?"));
        assert_eq!(metadata["transcription"], json!("I have a fever"));
        assert_eq!(metadata["complete"], json!(false));

        let audio = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(!audio.is_empty());
    }
}
