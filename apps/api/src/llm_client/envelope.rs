//! Response envelope of the Responses API and tolerant text extraction.
//!
//! The payload may arrive as a flat `output_text` field or spread across
//! `output[].content[]` parts of several types. Extraction never assumes one path.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

const SAMPLE_CHARS: usize = 120;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub output_text: Option<String>,
    #[serde(default, deserialize_with = "de_items")]
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// `None` when the item carries no content array at all.
    #[serde(default, deserialize_with = "de_parts")]
    pub content: Option<Vec<ContentPart>>,
}

/// One typed content part. Unrecognised layouts contribute no text.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    /// `{"type": "output_text", "text": ...}`
    OutputText(String),
    /// `{"type": "text", "text": ...}`
    Text(String),
    /// Any part carrying its payload in a nested `output_text` field.
    Nested { kind: Option<String>, text: String },
    Refusal(String),
    Unknown { kind: Option<String> },
}

impl From<Value> for ContentPart {
    fn from(value: Value) -> Self {
        let kind_tag = value.get("type").and_then(Value::as_str);
        let text = value.get("text").and_then(Value::as_str);
        let kind = kind_tag.map(str::to_string);

        match (kind_tag, text) {
            (Some("output_text"), Some(t)) => ContentPart::OutputText(t.to_string()),
            (Some("text"), Some(t)) => ContentPart::Text(t.to_string()),
            (Some("refusal"), _) => ContentPart::Refusal(
                value
                    .get("refusal")
                    .and_then(Value::as_str)
                    .or(text)
                    .unwrap_or_default()
                    .to_string(),
            ),
            _ => match value.get("output_text").and_then(Value::as_str) {
                Some(nested) => ContentPart::Nested {
                    kind,
                    text: nested.to_string(),
                },
                None => ContentPart::Unknown { kind },
            },
        }
    }
}

impl ContentPart {
    pub fn kind(&self) -> Option<&str> {
        match self {
            ContentPart::OutputText(_) => Some("output_text"),
            ContentPart::Text(_) => Some("text"),
            ContentPart::Refusal(_) => Some("refusal"),
            ContentPart::Nested { kind, .. } | ContentPart::Unknown { kind } => kind.as_deref(),
        }
    }

    /// The `text` field as the upstream shaped it, used for shape sampling.
    fn sample(&self) -> Option<&str> {
        match self {
            ContentPart::OutputText(t) | ContentPart::Text(t) => Some(t),
            _ => None,
        }
    }
}

fn de_items<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<OutputItem>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

fn de_parts<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<ContentPart>>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Array(parts)) => Some(parts.into_iter().map(ContentPart::from).collect()),
        _ => None,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

impl ResponseEnvelope {
    /// Returns the textual payload, trimmed. Empty when nothing usable was found.
    pub fn extract_text(&self) -> String {
        if let Some(flat) = self.output_text.as_deref() {
            if !flat.trim().is_empty() {
                return flat.trim().to_string();
            }
        }

        let mut joined = String::new();
        for item in &self.output {
            let Some(parts) = &item.content else { continue };
            for part in parts {
                match part {
                    ContentPart::OutputText(text) | ContentPart::Text(text) => joined.push_str(text),
                    ContentPart::Nested { text, .. } => joined.push_str(text),
                    ContentPart::Refusal(reason) => {
                        warn!(reason = %reason, "Model refused to produce the report");
                    }
                    ContentPart::Unknown { kind } => {
                        debug!(kind = ?kind, "Skipping content part with no extractable text");
                    }
                }
            }
        }
        joined.trim().to_string()
    }

    /// Structural summary for diagnostics. Carries at most a short sample of text.
    pub fn shape(&self) -> ResponseShape {
        ResponseShape {
            has_output_text: self.output_text.as_ref().map(|t| t.chars().count()),
            output_count: self.output.len(),
            output_types: self
                .output
                .iter()
                .map(|item| {
                    let parts = item.content.as_deref().unwrap_or_default();
                    OutputItemShape {
                        kind: item.kind.clone(),
                        content_count: parts.len(),
                        content_types: parts.iter().map(|p| p.kind().map(str::to_string)).collect(),
                        sample_text: parts
                            .iter()
                            .find_map(ContentPart::sample)
                            .map(|t| t.chars().take(SAMPLE_CHARS).collect())
                            .unwrap_or_default(),
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseShape {
    /// Length of the flat `output_text` field in characters, if present.
    pub has_output_text: Option<usize>,
    pub output_count: usize,
    pub output_types: Vec<OutputItemShape>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputItemShape {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub content_count: usize,
    pub content_types: Vec<Option<String>>,
    pub sample_text: String,
}
