/// LLM Client: the single point of entry for all model calls in revi.
///
/// ARCHITECTURAL RULE: No other module may call the OpenAI API directly.
/// All LLM interactions MUST go through `LlmCapability`.
///
/// Model: gpt-4o-mini (hardcoded, do not make configurable to prevent drift)
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

pub mod envelope;
pub mod openai;
pub mod prompts;

pub use envelope::{ResponseEnvelope, ResponseShape};
pub use openai::OpenAiClient;

/// The model used for every analysis call.
pub const MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Opaque handle to a document stored on the provider side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub id: String,
}

/// One structured-generation call: instructions, the uploaded document and the closed schema.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub file: FileHandle,
    pub schema_name: &'static str,
    pub schema: Value,
    pub max_output_tokens: u32,
}

/// The LLM capability used by the review orchestrator.
///
/// Carried in `AppState` as `Arc<dyn LlmCapability>`; tests substitute a scripted stub.
#[async_trait]
pub trait LlmCapability: Send + Sync {
    async fn upload_document(&self, filename: &str, bytes: Bytes) -> Result<FileHandle, LlmError>;

    async fn generate(&self, request: &GenerationRequest) -> Result<ResponseEnvelope, LlmError>;
}
