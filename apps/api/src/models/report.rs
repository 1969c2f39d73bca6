//! The ATS review report: produced once per analysis, resubmitted wholesale for PDF rendering.
//!
//! Wire names follow the JSON contract handed to the model (`ats_score`, `top_fixes[].why`, ...).
//! Deserialization is lenient at the edges: scores are rounded and clamped,
//! `null` strings become `""`, missing arrays become empty. `ats_score` is the one field whose
//! absence rejects the whole payload.

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// 0–100 estimate of how well the résumé survives ATS filtering.
    #[serde(rename = "ats_score", deserialize_with = "de_score")]
    pub score: u8,
    #[serde(default, deserialize_with = "de_strings")]
    pub summary: Vec<String>,
    #[serde(default, deserialize_with = "de_list")]
    pub top_fixes: Vec<Fix>,
    #[serde(rename = "ats_checklist", default, deserialize_with = "de_list")]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default, deserialize_with = "de_strings")]
    pub suggested_keywords: Vec<String>,
    #[serde(default, deserialize_with = "de_list")]
    pub rewritten_bullets: Vec<BulletPair>,
    #[serde(default, deserialize_with = "de_strings")]
    pub template_outline: Vec<String>,
    #[serde(default, deserialize_with = "de_list")]
    pub best_matches: Vec<RoleMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    #[serde(default, deserialize_with = "de_text")]
    pub title: String,
    #[serde(rename = "why", default, deserialize_with = "de_text")]
    pub rationale: String,
    #[serde(rename = "example_fix", default, deserialize_with = "de_text")]
    pub example_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    #[serde(rename = "item", default, deserialize_with = "de_text")]
    pub label: String,
    #[serde(default)]
    pub status: CheckStatus,
    /// May be empty; never absent on the wire.
    #[serde(default, deserialize_with = "de_text")]
    pub note: String,
}

/// Checklist verdict. Anything other than `"ok"` is treated as a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum CheckStatus {
    Ok,
    #[default]
    Warn,
}

impl From<Option<String>> for CheckStatus {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("ok") => CheckStatus::Ok,
            _ => CheckStatus::Warn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletPair {
    /// Empty when the bullet could not be confidently extracted from the source PDF.
    #[serde(default, deserialize_with = "de_text")]
    pub original: String,
    #[serde(default, deserialize_with = "de_text")]
    pub improved: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleMatch {
    #[serde(default, deserialize_with = "de_text")]
    pub role: String,
    #[serde(default, deserialize_with = "de_score_or_zero")]
    pub match_score: u8,
    #[serde(default, deserialize_with = "de_strings")]
    pub why_fit: Vec<String>,
    #[serde(default, deserialize_with = "de_strings")]
    pub missing_keywords: Vec<String>,
    #[serde(default, deserialize_with = "de_strings")]
    pub recommended_changes: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient field deserializers
// ────────────────────────────────────────────────────────────────────────────

/// Accepts integers, floats and numeric strings; rounds and clamps into 0–100.
fn score_from_value(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

fn de_score<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let value = Value::deserialize(d)?;
    score_from_value(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a 0-100 score, got {value}")))
}

fn de_score_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(score_from_value(&value).unwrap_or(0))
}

fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn de_strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let items = Option::<Vec<Option<String>>>::deserialize(d)?.unwrap_or_default();
    Ok(items.into_iter().map(Option::unwrap_or_default).collect())
}

fn de_list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
