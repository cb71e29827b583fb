use crate::error::{validation_error, ApiResult};
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/generate-captions", post(generate_captions))
        .with_state(state)
}

/// Captions a batch of uploaded images. A failure on one image becomes a
/// placeholder caption so the rest of the batch still comes back in order.
async fn generate_captions(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let mut images: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| validation_error(&format!("malformed multipart body: {e}")))?
    {
        if field.name().unwrap_or_default() != "images" {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| validation_error(&format!("failed to read image field: {e}")))?;
        images.push((file_name, bytes.to_vec()));
    }

    if images.is_empty() {
        return Err(validation_error(
            "No images provided. Please include files in the 'images' field.",
        ));
    }

    let mut captions = Vec::with_capacity(images.len());
    for (file_name, bytes) in &images {
        match state.vision.caption(bytes, file_name).await {
            Ok(caption) => captions.push(caption),
            Err(e) => {
                error!("failed to caption image {}: {}", file_name, e);
                captions.push(format!("Could not generate caption for {file_name}"));
            }
        }
    }

    Ok(Json(json!({
        "success": true,
        "captions": captions,
    })))
}
