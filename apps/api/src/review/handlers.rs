//! Axum route handlers for the Review API.

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Language, Report};
use crate::render::{render_pdf, RenderOptions};
use crate::review::analyzer::{analyze, AnalysisRequest};
use crate::review::intake::validate_upload;
use crate::state::AppState;

/// Used when the upload carries no filename of its own.
const FALLBACK_FILENAME: &str = "cv.pdf";

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ReviewForm {
    cv: Bytes,
    filename: Option<String>,
    content_type: Option<String>,
    role_target: Option<String>,
    language: Language,
}

#[derive(Debug, Deserialize)]
pub struct PdfRequest {
    #[serde(default)]
    pub report: Option<Report>,
    #[serde(default)]
    pub lang: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/reviews
///
/// Multipart form: `cv` (PDF), `roleTarget` (optional), `lang` (`es` | `en`).
/// Guards run before any model call; returns the decoded report.
pub async fn handle_review(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Report>, AppError> {
    let llm = state.llm.clone().ok_or_else(|| {
        AppError::Configuration("OPENAI_API_KEY is not configured on the server.".to_string())
    })?;

    let request_id = Uuid::new_v4();
    async move {
        let form = read_form(&mut multipart).await?;
        let pages = validate_upload(
            form.filename.as_deref(),
            form.content_type.as_deref(),
            &form.cv,
        )
        .map_err(|e| AppError::Validation(e.message(form.language)))?;
        info!(
            pages,
            bytes = form.cv.len(),
            lang = form.language.tag(),
            role_target = form.role_target.is_some(),
            "Upload accepted"
        );

        let report = analyze(
            llm.as_ref(),
            AnalysisRequest {
                document: form.cv.clone(),
                filename: form.filename.as_deref().unwrap_or(FALLBACK_FILENAME),
                target_role: form.role_target.as_deref(),
                language: form.language,
            },
        )
        .await?;

        Ok::<_, AppError>(Json(report))
    }
    .instrument(info_span!("review", %request_id))
    .await
}

/// POST /api/v1/reviews/pdf
///
/// Renders a previously returned report as a downloadable PDF.
pub async fn handle_report_pdf(
    State(state): State<AppState>,
    payload: Result<Json<PdfRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload
        .map_err(|e| AppError::Validation(format!("Invalid report payload: {}", e.body_text())))?;
    let report = request
        .report
        .ok_or_else(|| AppError::Validation("Missing report.".to_string()))?;
    let language = request
        .lang
        .as_deref()
        .map(Language::from_tag)
        .unwrap_or_default();

    let options = RenderOptions {
        language,
        generated_on: Utc::now().date_naive(),
        geometry: state.page,
    };
    let bytes = tokio::task::spawn_blocking(move || render_pdf(&report, &options))
        .await
        .map_err(|e| anyhow::anyhow!("render task failed: {e}"))??;

    info!(bytes = bytes.len(), lang = language.tag(), "Report PDF rendered");

    let disposition = format!("attachment; filename=\"{}\"", language.report_filename());
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn read_form(multipart: &mut Multipart) -> Result<ReviewForm, AppError> {
    let mut form = ReviewForm::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "cv" => {
                form.filename = field.file_name().map(str::to_string);
                form.content_type = field.content_type().map(str::to_string);
                form.cv = field.bytes().await.map_err(invalid_form)?;
            }
            "roleTarget" => {
                let text = field.text().await.map_err(invalid_form)?;
                let text = text.trim();
                form.role_target = (!text.is_empty()).then(|| text.to_string());
            }
            "lang" => {
                form.language = Language::from_tag(&field.text().await.map_err(invalid_form)?);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn invalid_form(err: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid form data: {}", err.body_text()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::layout::PageGeometry;
    use crate::llm_client::testing::StubLlm;
    use crate::models::report::fixtures::sample_report;
    use crate::review::intake::fixtures::blank_pdf;
    use crate::routes::build_router;

    use super::*;

    const BOUNDARY: &str = "revi-test-boundary";

    fn app(llm: Option<Arc<StubLlm>>) -> Router {
        build_router(AppState {
            llm: llm.map(|s| s as Arc<dyn crate::llm_client::LlmCapability>),
            page: PageGeometry::A4,
        })
    }

    enum Part<'a> {
        File { name: &'a str, filename: &'a str, content_type: &'a str, bytes: Vec<u8> },
        Text { name: &'a str, value: &'a str },
    }

    fn multipart_request(parts: Vec<Part<'_>>) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File { name, filename, content_type, bytes } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(&bytes);
                }
                Part::Text { name, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/reviews")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn cv(pages: usize) -> Part<'static> {
        Part::File {
            name: "cv",
            filename: "cv.pdf",
            content_type: "application/pdf",
            bytes: blank_pdf(pages),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_three_page_cv_rejected_before_any_model_call() {
        let stub = Arc::new(StubLlm::with_texts(&[]));
        let response = app(Some(stub.clone()))
            .oneshot(multipart_request(vec![cv(3)]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Tu CV tiene 3 páginas. Máximo permitido: 2.");
        assert_eq!(stub.upload_count(), 0);
        assert_eq!(stub.generation_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_a_configuration_error() {
        let response = app(None)
            .oneshot(multipart_request(vec![cv(1)]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
    }

    #[tokio::test]
    async fn test_missing_file_part() {
        let stub = Arc::new(StubLlm::with_texts(&[]));
        let response = app(Some(stub.clone()))
            .oneshot(multipart_request(vec![Part::Text { name: "lang", value: "en" }]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "No 'cv' file (PDF) was received.");
        assert_eq!(stub.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_review_returns_report_and_passes_form_fields() {
        let raw = serde_json::to_string(&sample_report()).unwrap();
        let stub = Arc::new(StubLlm::with_texts(&[raw.as_str()]));
        let response = app(Some(stub.clone()))
            .oneshot(multipart_request(vec![
                cv(2),
                Part::Text { name: "roleTarget", value: "  Backend Engineer " },
                Part::Text { name: "lang", value: "en" },
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ats_score"], 92);
        assert_eq!(body["top_fixes"].as_array().unwrap().len(), 5);

        assert_eq!(stub.upload_count(), 1);
        assert_eq!(stub.generation_count(), 1);
        let requests = stub.requests.lock().unwrap();
        assert!(requests[0].system.contains("English"));
        assert!(requests[0].user.contains("Backend Engineer"));
        assert_eq!(requests[0].file.id, "file-cv.pdf");
    }

    #[tokio::test]
    async fn test_double_decode_failure_surfaces_diagnostics() {
        let stub = Arc::new(StubLlm::with_texts(&["I cannot help with that.", "{\"ats_score\": 7"]));
        let response = app(Some(stub.clone()))
            .oneshot(multipart_request(vec![cv(1)]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "DECODE_FAILED");
        assert_eq!(body["error"]["details"]["raw_head"], "{\"ats_score\": 7");
        assert_eq!(stub.generation_count(), 2);
    }

    #[tokio::test]
    async fn test_pdf_endpoint_returns_attachment() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/reviews/pdf")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "report": sample_report(), "lang": "en" }).to_string(),
            ))
            .unwrap();
        let response = app(None).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"ats-report.pdf\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(lopdf::Document::load_mem(&bytes).unwrap().get_pages().len() > 1);
    }

    #[tokio::test]
    async fn test_pdf_endpoint_requires_report() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/reviews/pdf")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "lang": "es" }).to_string()))
            .unwrap();
        let response = app(None).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "Missing report.");
    }
}
