//! Resilient Response Decoder: turns whatever text the model returned into a `Report`.
//!
//! The model is given a closed schema, yet still occasionally answers with near-JSON:
//! fenced in Markdown, wrapped in prose, quoted as a string literal, or with raw control
//! characters inside strings. Every recoverable shape is tried before giving up.
//!
//! # Cascade
//! Each strategy is a pure `fn(&str) -> Option<Map>` over the fence-stripped text and must
//! yield an object (not necessarily a schema-valid one). First hit wins:
//! 1. `Direct`               : parse as-is
//! 2. `DoubleEncoded`        : parse as a JSON string literal, then parse its content
//! 3. `Embedded`             : first `{` .. last `}`
//! 4. `EmbeddedSanitized`    : same slice, raw control chars inside strings escaped
//! 5. `EmbeddedUnescaped`    : same slice after a conservative unescape pass
//! 6. `EmbeddedDoubleEncoded`: first `"{` .. last `}"`, double-parsed
//! 7. `Unescaped`            : the whole text after the unescape pass

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Report;
use crate::schema::{self, SchemaViolation};

const HEAD_CHARS: usize = 1200;
const TAIL_CHARS: usize = 300;

// ────────────────────────────────────────────────────────────────────────────
// Result / error types
// ────────────────────────────────────────────────────────────────────────────

/// Which cascade step recovered the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Direct,
    DoubleEncoded,
    Embedded,
    EmbeddedSanitized,
    EmbeddedUnescaped,
    EmbeddedDoubleEncoded,
    Unescaped,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::DoubleEncoded => "double_encoded",
            Strategy::Embedded => "embedded",
            Strategy::EmbeddedSanitized => "embedded_sanitized",
            Strategy::EmbeddedUnescaped => "embedded_unescaped",
            Strategy::EmbeddedDoubleEncoded => "embedded_double_encoded",
            Strategy::Unescaped => "unescaped",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Decoded {
    pub report: Report,
    pub strategy: Strategy,
    /// Cardinality breaches and unknown keys. Informational only.
    pub violations: Vec<SchemaViolation>,
}

/// Operator-facing context about a payload that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Length of the raw text in bytes.
    pub raw_length: usize,
    pub raw_head: String,
    pub raw_tail: String,
}

impl Diagnostics {
    pub fn capture(raw: &str) -> Self {
        let total = raw.chars().count();
        Diagnostics {
            raw_length: raw.len(),
            raw_head: raw.chars().take(HEAD_CHARS).collect(),
            raw_tail: raw.chars().skip(total.saturating_sub(TAIL_CHARS)).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no JSON object could be recovered from {} bytes of model output", .0.raw_length)]
    Unrecoverable(Diagnostics),

    #[error("recovered JSON does not match the report contract: {message}")]
    Contract {
        message: String,
        diagnostics: Diagnostics,
    },
}

impl DecodeError {
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            DecodeError::Unrecoverable(d) => d,
            DecodeError::Contract { diagnostics, .. } => diagnostics,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

type Attempt = fn(&str) -> Option<Map<String, Value>>;

const CASCADE: &[(Strategy, Attempt)] = &[
    (Strategy::Direct, parse_object),
    (Strategy::DoubleEncoded, parse_double_encoded),
    (Strategy::Embedded, embedded),
    (Strategy::EmbeddedSanitized, embedded_sanitized),
    (Strategy::EmbeddedUnescaped, embedded_unescaped),
    (Strategy::EmbeddedDoubleEncoded, embedded_double_encoded),
    (Strategy::Unescaped, unescaped),
];

/// Decodes raw model output into a `Report`. Never substitutes a default report.
pub fn decode(raw: &str) -> Result<Decoded, DecodeError> {
    let cleaned = strip_code_fences(raw);

    let (strategy, object) =
        recover_object(cleaned).ok_or_else(|| DecodeError::Unrecoverable(Diagnostics::capture(raw)))?;
    debug!(strategy = strategy.as_str(), "Recovered JSON object from model output");

    let unknown = schema::unknown_fields(&object);
    let report: Report =
        serde_json::from_value(Value::Object(object)).map_err(|e| DecodeError::Contract {
            message: e.to_string(),
            diagnostics: Diagnostics::capture(raw),
        })?;

    let mut violations = schema::check(&report);
    violations.extend(unknown.into_iter().map(SchemaViolation::unknown_field));
    if !violations.is_empty() {
        warn!(
            count = violations.len(),
            first = %violations[0],
            "Decoded report breaks the schema contract; rendering will truncate"
        );
    }

    Ok(Decoded {
        report,
        strategy,
        violations,
    })
}

/// Runs the cascade over already fence-stripped text.
pub fn recover_object(cleaned: &str) -> Option<(Strategy, Map<String, Value>)> {
    CASCADE
        .iter()
        .find_map(|(strategy, attempt)| attempt(cleaned).map(|object| (*strategy, object)))
}

/// Strips ```json ... ``` (any case) or bare ``` ... ``` fences and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text
}

// ────────────────────────────────────────────────────────────────────────────
// Strategies
// ────────────────────────────────────────────────────────────────────────────

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(object) => Some(object),
        _ => None,
    }
}

fn parse_double_encoded(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::String(inner) => parse_object(&inner),
        _ => None,
    }
}

fn embedded(text: &str) -> Option<Map<String, Value>> {
    brace_slice(text).and_then(parse_object)
}

fn embedded_sanitized(text: &str) -> Option<Map<String, Value>> {
    brace_slice(text).and_then(|slice| parse_object(&escape_control_chars(slice)))
}

fn embedded_unescaped(text: &str) -> Option<Map<String, Value>> {
    brace_slice(text).and_then(|slice| parse_object(&escape_control_chars(&unescape_jsonish(slice))))
}

fn embedded_double_encoded(text: &str) -> Option<Map<String, Value>> {
    let start = text.find("\"{")?;
    let end = text.rfind("}\"")?;
    if end <= start {
        return None;
    }
    parse_double_encoded(&text[start..end + 2])
}

fn unescaped(text: &str) -> Option<Map<String, Value>> {
    parse_object(&escape_control_chars(&unescape_jsonish(text)))
}

// ────────────────────────────────────────────────────────────────────────────
// Text helpers
// ────────────────────────────────────────────────────────────────────────────

/// First `{` through last `}`, if they are in that order.
fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Turns escaped newline/tab/quote/backslash sequences into the literal characters.
fn unescape_jsonish(text: &str) -> String {
    text.replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
        .replace("\\\"", "\"")
        .replace("\\\\", "\\")
}

/// Escapes raw control characters that appear inside string literals. Structure outside
/// strings is left alone, where such characters are plain whitespace.
fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }
        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }

    out
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::fixtures::sample_report;

    #[test]
    fn test_valid_report_decodes_unchanged() {
        let report = sample_report();
        let raw = serde_json::to_string_pretty(&report).unwrap();
        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded.report, report);
        assert_eq!(decoded.strategy, Strategy::Direct);
        assert!(decoded.violations.is_empty());
    }

    #[test]
    fn test_fenced_json_decodes_via_direct() {
        let raw = "```json\n{\"ats_score\":80}\n```";
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.report.score, 80);
        assert_eq!(decoded.strategy, Strategy::Direct);
    }

    #[test]
    fn test_uppercase_and_bare_fences() {
        assert_eq!(strip_code_fences("```JSON\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```"), "");
    }

    #[test]
    fn test_full_report_in_fences_is_identity() {
        let report = sample_report();
        let raw = format!("```json\n{}\n```", serde_json::to_string(&report).unwrap());
        assert_eq!(decode(&raw).unwrap().report, report);
    }

    #[test]
    fn test_prose_wrapped_json_decodes_via_embedded() {
        let report = sample_report();
        let raw = format!(
            "Here is the ATS review you asked for:\n{}\nLet me know if you need anything else.",
            serde_json::to_string(&report).unwrap()
        );
        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded.report, report);
        assert_eq!(decoded.strategy, Strategy::Embedded);
    }

    #[test]
    fn test_double_encoded_decodes_via_double_parse() {
        let raw = r#""{\"ats_score\":80}""#;
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.report.score, 80);
        assert_eq!(decoded.strategy, Strategy::DoubleEncoded);
    }

    #[test]
    fn test_double_encoded_full_report_is_identity() {
        let report = sample_report();
        let inner = serde_json::to_string(&report).unwrap();
        let raw = serde_json::to_string(&inner).unwrap();
        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded.report, report);
        assert_eq!(decoded.strategy, Strategy::DoubleEncoded);
    }

    #[test]
    fn test_raw_newline_inside_string_is_sanitized() {
        let raw = "{\"ats_score\": 75, \"summary\": [\"line one\nline two\"]}";
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.strategy, Strategy::EmbeddedSanitized);
        assert_eq!(decoded.report.summary, vec!["line one\nline two".to_string()]);
    }

    #[test]
    fn test_escaped_object_without_outer_quotes_is_unescaped() {
        let raw = r#"Result: {\"ats_score\": 66, \"summary\": [\"ok\"]}"#;
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.strategy, Strategy::EmbeddedUnescaped);
        assert_eq!(decoded.report.score, 66);
    }

    #[test]
    fn test_quoted_payload_inside_prose_is_double_parsed() {
        // The escaped newline makes the unescape heuristic produce invalid JSON.
        let raw = r#"The payload is "{\"summary\": [\"a\\nb\"], \"ats_score\": 58}" as requested."#;
        let (strategy, object) = recover_object(raw).unwrap();
        assert_eq!(strategy, Strategy::EmbeddedDoubleEncoded);
        assert_eq!(object["ats_score"], 58);
        assert_eq!(object["summary"][0], "a\nb");
    }

    #[test]
    fn test_strategies_are_independently_usable() {
        assert!(parse_object("[1, 2]").is_none(), "arrays are not objects");
        assert!(parse_double_encoded("{\"a\":1}").is_none());
        assert!(embedded("no braces here").is_none());
        assert!(brace_slice("} backwards {").is_none());
        assert_eq!(unescape_jsonish(r#"a\nb\"c\\d"#), "a\nb\"c\\d");
    }

    #[test]
    fn test_garbage_fails_with_diagnostics_and_no_default() {
        let raw = "I'm sorry, I cannot review this document.";
        let err = decode(raw).unwrap_err();
        assert!(matches!(err, DecodeError::Unrecoverable(_)));
        let diag = err.diagnostics();
        assert_eq!(diag.raw_length, raw.len());
        assert_eq!(diag.raw_head, raw);
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(decode(""), Err(DecodeError::Unrecoverable(_))));
        assert!(matches!(decode("```json\n```"), Err(DecodeError::Unrecoverable(_))));
    }

    #[test]
    fn test_truncated_json_fails() {
        let raw = "{\"ats_score\": 80, \"summary\": [\"Strong profile\", \"Needs";
        assert!(decode(raw).is_err());
    }

    #[test]
    fn test_object_without_score_is_contract_error() {
        let err = decode("{\"summary\": [\"a\", \"b\", \"c\"]}").unwrap_err();
        assert!(matches!(err, DecodeError::Contract { .. }));
        assert!(err.to_string().contains("ats_score"));
    }

    #[test]
    fn test_cardinality_breach_is_reported_not_fatal() {
        let decoded = decode("{\"ats_score\": 40, \"extra\": true}").unwrap();
        assert_eq!(decoded.report.score, 40);
        assert!(decoded.violations.iter().any(|v| v.field == "top_fixes"));
        assert!(decoded.violations.iter().any(|v| v.field == "extra"));
    }

    #[test]
    fn test_diagnostics_head_and_tail_are_bounded_and_char_safe() {
        let raw = "é".repeat(2000);
        let diag = Diagnostics::capture(&raw);
        assert_eq!(diag.raw_length, 4000);
        assert_eq!(diag.raw_head.chars().count(), HEAD_CHARS);
        assert_eq!(diag.raw_tail.chars().count(), TAIL_CHARS);
    }
}
