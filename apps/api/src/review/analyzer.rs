//! Report Orchestrator: upload, generate, extract, decode, and retry once.
//!
//! Attempt policy:
//! 1. initial call with the standard instructions and a 2600-token budget
//! 2. on a decode failure or empty output only: one retry with the strict suffix and a
//!    4200-token budget (truncation is the usual cause of both)
//!
//! Transport and API errors are never retried here. No fallback report is ever produced.

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::decode::{decode, DecodeError};
use crate::llm_client::{
    FileHandle, GenerationRequest, LlmCapability, LlmError, ResponseShape,
};
use crate::models::{Language, Report};
use crate::review::prompts::{build_system_prompt, build_user_prompt};
use crate::schema::{report_schema, SCHEMA_NAME};

pub const INITIAL_OUTPUT_TOKENS: u32 = 2600;
pub const RETRY_OUTPUT_TOKENS: u32 = 4200;

/// Minimum number of characters for extracted text to count as output at all.
const MIN_TEXT_CHARS: usize = 2;

#[derive(Debug, Clone)]
pub struct AnalysisRequest<'a> {
    pub document: Bytes,
    pub filename: &'a str,
    pub target_role: Option<&'a str>,
    pub language: Language,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("document upload failed: {0}")]
    Upload(#[source] LlmError),

    #[error("generation call failed: {0}")]
    Generation(#[source] LlmError),

    #[error("the model returned no extractable content")]
    EmptyOutput { shape: ResponseShape },

    #[error("the model output could not be decoded as a report: {error}")]
    Decode {
        #[source]
        error: DecodeError,
        shape: ResponseShape,
    },
}

impl AnalysisError {
    /// Only output-quality failures earn the single retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmptyOutput { .. } | AnalysisError::Decode { .. }
        )
    }
}

/// Runs one analysis against the given capability.
pub async fn analyze(
    llm: &dyn LlmCapability,
    request: AnalysisRequest<'_>,
) -> Result<Report, AnalysisError> {
    let file = llm
        .upload_document(request.filename, request.document.clone())
        .await
        .map_err(AnalysisError::Upload)?;

    let user = build_user_prompt(request.target_role);
    let schema = report_schema();

    match run_attempt(llm, &file, &user, &schema, request.language, false).await {
        Err(err) if err.is_retryable() => {
            warn!(error = %err, "First attempt unusable, retrying once with strict instructions");
            run_attempt(llm, &file, &user, &schema, request.language, true).await
        }
        other => other,
    }
}

async fn run_attempt(
    llm: &dyn LlmCapability,
    file: &FileHandle,
    user: &str,
    schema: &Value,
    language: Language,
    strict: bool,
) -> Result<Report, AnalysisError> {
    let request = GenerationRequest {
        system: build_system_prompt(language, strict),
        user: user.to_string(),
        file: file.clone(),
        schema_name: SCHEMA_NAME,
        schema: schema.clone(),
        max_output_tokens: if strict {
            RETRY_OUTPUT_TOKENS
        } else {
            INITIAL_OUTPUT_TOKENS
        },
    };

    let envelope = llm
        .generate(&request)
        .await
        .map_err(AnalysisError::Generation)?;

    let text = envelope.extract_text();
    if text.chars().count() < MIN_TEXT_CHARS {
        return Err(AnalysisError::EmptyOutput {
            shape: envelope.shape(),
        });
    }

    let decoded = decode(&text).map_err(|error| AnalysisError::Decode {
        error,
        shape: envelope.shape(),
    })?;

    info!(
        strategy = decoded.strategy.as_str(),
        violations = decoded.violations.len(),
        score = decoded.report.score,
        strict,
        "Report decoded"
    );

    Ok(decoded.report)
}
