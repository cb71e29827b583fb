use crate::error::{validation_error, ApiResult};
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/doc", post(extract_documents))
        .with_state(state)
}

/// Extracts text from one or more uploaded documents. A failure on one
/// file is reported in its result entry without failing the batch.
async fn extract_documents(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let mut documents: Vec<(String, Vec<u8>)> = Vec::new();
    let mut language = "english".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| validation_error(&format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "documents" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if file_name.is_empty() {
                    continue;
                }
                let bytes = field.bytes().await.map_err(|e| {
                    validation_error(&format!("failed to read document field: {e}"))
                })?;
                documents.push((file_name, bytes.to_vec()));
            }
            "language" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| validation_error(&format!("failed to read language field: {e}")))?;
                if !text.trim().is_empty() {
                    language = text;
                }
            }
            _ => {}
        }
    }

    if documents.is_empty() {
        return Err(validation_error(
            "No documents provided. Please include files in the 'documents' field.",
        ));
    }

    let mut results = Vec::with_capacity(documents.len());
    for (file_name, bytes) in &documents {
        match state.docs.extract(bytes, file_name, &language).await {
            Ok(extracted) => {
                info!("extracted document {}", file_name);
                results.push(json!({
                    "filename": file_name,
                    "extracted_text": extracted,
                }));
            }
            Err(e) => {
                error!("failed to extract document {}: {}", file_name, e);
                results.push(json!({
                    "filename": file_name,
                    "error": e.to_string(),
                }));
            }
        }
    }

    Ok(Json(json!({
        "success": true,
        "results": results,
        "message": "Document processing complete.",
    })))
}

#[cfg(test)]
mod tests {
    use super::super::testutil::app_with_llm;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_doc_extracts_each_upload() {
        let app = app_with_llm(vec![]);
        let boundary = "docboundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"documents\"; filename=\"report.pdf\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4\r\n--{boundary}--\r\n"
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/doc")
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
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["results"][0]["filename"], json!("report.pdf"));
        assert_eq!(
            body["results"][0]["extracted_text"],
            json!("Blood report: all values normal.")
        );
    }

    #[tokio::test]
    async fn test_doc_requires_documents_field() {
        let app = app_with_llm(vec![]);
        let boundary = "docboundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"language\"\r\n\r\nenglish\r\n--{boundary}--\r\n"
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/doc")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
