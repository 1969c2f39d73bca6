//! OpenAI implementation of `LlmCapability`: Files API upload + Responses API generation.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{FileHandle, GenerationRequest, LlmCapability, LlmError, ResponseEnvelope, MODEL};

const FILES_URL: &str = "https://api.openai.com/v1/files";
const RESPONSES_URL: &str = "https://api.openai.com/v1/responses";
/// Matches the provider SDK's default; this layer adds no timeout of its own.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);
const TEMPERATURE: f32 = 0.0;

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: Vec<InputMessage<'a>>,
    text: TextConfig<'a>,
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<InputPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputPart<'a> {
    InputText { text: &'a str },
    InputFile { file_id: &'a str },
}

#[derive(Debug, Serialize)]
struct TextConfig<'a> {
    format: TextFormat<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum TextFormat<'a> {
    #[serde(rename = "json_schema")]
    JsonSchema {
        name: &'a str,
        schema: &'a Value,
        strict: bool,
    },
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Constructed once at startup from the configured credential and shared via `AppState`.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
        })
    }

    /// Reads the body, mapping non-2xx statuses to `LlmError::Api` with the upstream message.
    async fn read_body(response: Response) -> Result<String, LlmError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}

fn build_request<'a>(request: &'a GenerationRequest) -> ResponsesRequest<'a> {
    ResponsesRequest {
        model: MODEL,
        input: vec![
            InputMessage {
                role: "system",
                content: MessageContent::Text(&request.system),
            },
            InputMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    InputPart::InputText {
                        text: &request.user,
                    },
                    InputPart::InputFile {
                        file_id: &request.file.id,
                    },
                ]),
            },
        ],
        text: TextConfig {
            format: TextFormat::JsonSchema {
                name: request.schema_name,
                schema: &request.schema,
                strict: true,
            },
        },
        max_output_tokens: request.max_output_tokens,
        temperature: TEMPERATURE,
    }
}

#[async_trait]
impl LlmCapability for OpenAiClient {
    async fn upload_document(&self, filename: &str, bytes: Bytes) -> Result<FileHandle, LlmError> {
        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);

        let response = self
            .client
            .post(FILES_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        let uploaded: UploadedFile = serde_json::from_str(&body)?;
        debug!(file_id = %uploaded.id, "Uploaded document");
        Ok(FileHandle { id: uploaded.id })
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ResponseEnvelope, LlmError> {
        let response = self
            .client
            .post(RESPONSES_URL)
            .bearer_auth(&self.api_key)
            .json(&build_request(request))
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        let envelope: ResponseEnvelope = serde_json::from_str(&body)?;
        debug!(
            output_items = envelope.output.len(),
            has_output_text = envelope.output_text.is_some(),
            "Generation call succeeded"
        );
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_request() -> GenerationRequest {
        GenerationRequest {
            system: "sys".to_string(),
            user: "usr".to_string(),
            file: FileHandle {
                id: "file-abc".to_string(),
            },
            schema_name: "ats_review",
            schema: json!({ "type": "object" }),
            max_output_tokens: 2600,
        }
    }

    #[test]
    fn test_request_body_matches_responses_api() {
        let req = sample_request();
        let body = serde_json::to_value(build_request(&req)).unwrap();

        assert_eq!(body["model"], MODEL);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_output_tokens"], 2600);
        assert_eq!(body["input"][0]["role"], "system");
        assert_eq!(body["input"][0]["content"], "sys");
        assert_eq!(body["input"][1]["content"][0]["type"], "input_text");
        assert_eq!(body["input"][1]["content"][1]["type"], "input_file");
        assert_eq!(body["input"][1]["content"][1]["file_id"], "file-abc");
        assert_eq!(body["text"]["format"]["type"], "json_schema");
        assert_eq!(body["text"]["format"]["name"], "ats_review");
        assert_eq!(body["text"]["format"]["strict"], true);
        assert_eq!(body["text"]["format"]["schema"]["type"], "object");
    }

    #[test]
    fn test_client_builds() {
        assert!(OpenAiClient::new("sk-test".to_string()).is_ok());
    }
}
