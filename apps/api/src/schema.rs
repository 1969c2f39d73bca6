//! Schema Contract: the closed JSON schema handed to the model and the cardinality
//! checks re-applied to whatever comes back.
//!
//! The bounds below are the single source of truth: the prompt builder, the decoder's
//! re-validation and the renderer's truncation all read them from here.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::Report;

/// Inclusive item-count bounds for one array field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: usize,
    pub max: usize,
}

impl Bounds {
    const fn exactly(n: usize) -> Self {
        Bounds { min: n, max: n }
    }

    const fn between(min: usize, max: usize) -> Self {
        Bounds { min, max }
    }

    pub fn contains(&self, n: usize) -> bool {
        (self.min..=self.max).contains(&n)
    }
}

pub const SUMMARY: Bounds = Bounds::between(3, 6);
pub const TOP_FIXES: Bounds = Bounds::exactly(5);
pub const CHECKLIST: Bounds = Bounds::between(10, 12);
pub const SUGGESTED_KEYWORDS: Bounds = Bounds::between(10, 18);
pub const REWRITTEN_BULLETS: Bounds = Bounds::exactly(5);
pub const TEMPLATE_OUTLINE: Bounds = Bounds::between(5, 7);
pub const BEST_MATCHES: Bounds = Bounds::exactly(3);
pub const WHY_FIT: Bounds = Bounds::between(2, 4);
pub const MISSING_KEYWORDS: Bounds = Bounds::between(5, 12);
pub const RECOMMENDED_CHANGES: Bounds = Bounds::between(3, 6);

/// Name the schema is registered under in the structured-output request.
pub const SCHEMA_NAME: &str = "ats_review";

const TOP_LEVEL_FIELDS: &[&str] = &[
    "ats_score",
    "summary",
    "top_fixes",
    "ats_checklist",
    "suggested_keywords",
    "rewritten_bullets",
    "template_outline",
    "best_matches",
];

const ITEM_FIELDS: &[(&str, &[&str])] = &[
    ("top_fixes", &["title", "why", "example_fix"]),
    ("ats_checklist", &["item", "status", "note"]),
    ("rewritten_bullets", &["original", "improved"]),
    (
        "best_matches",
        &[
            "role",
            "match_score",
            "why_fit",
            "missing_keywords",
            "recommended_changes",
        ],
    ),
];

// ────────────────────────────────────────────────────────────────────────────
// Generation schema
// ────────────────────────────────────────────────────────────────────────────

fn string_array(bounds: Bounds) -> Value {
    json!({
        "type": "array",
        "minItems": bounds.min,
        "maxItems": bounds.max,
        "items": { "type": "string" }
    })
}

fn object_array(bounds: Bounds, properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "array",
        "minItems": bounds.min,
        "maxItems": bounds.max,
        "items": {
            "type": "object",
            "additionalProperties": false,
            "properties": properties,
            "required": required
        }
    })
}

/// The closed structural contract sent with every generation request.
/// Every object is `additionalProperties: false` and lists all of its keys as required.
pub fn report_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "ats_score": { "type": "integer", "minimum": 0, "maximum": 100 },
            "summary": string_array(SUMMARY),
            "top_fixes": object_array(
                TOP_FIXES,
                json!({
                    "title": { "type": "string" },
                    "why": { "type": "string" },
                    "example_fix": { "type": "string" }
                }),
                &["title", "why", "example_fix"],
            ),
            "ats_checklist": object_array(
                CHECKLIST,
                json!({
                    "item": { "type": "string" },
                    "status": { "type": "string", "enum": ["ok", "warn"] },
                    "note": { "type": "string" }
                }),
                &["item", "status", "note"],
            ),
            "suggested_keywords": string_array(SUGGESTED_KEYWORDS),
            "rewritten_bullets": object_array(
                REWRITTEN_BULLETS,
                json!({
                    "original": { "type": "string" },
                    "improved": { "type": "string" }
                }),
                &["original", "improved"],
            ),
            "template_outline": string_array(TEMPLATE_OUTLINE),
            "best_matches": object_array(
                BEST_MATCHES,
                json!({
                    "role": { "type": "string" },
                    "match_score": { "type": "integer", "minimum": 0, "maximum": 100 },
                    "why_fit": string_array(WHY_FIT),
                    "missing_keywords": string_array(MISSING_KEYWORDS),
                    "recommended_changes": string_array(RECOMMENDED_CHANGES)
                }),
                &[
                    "role",
                    "match_score",
                    "why_fit",
                    "missing_keywords",
                    "recommended_changes",
                ],
            )
        },
        "required": TOP_LEVEL_FIELDS
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Re-validation of decoded output
// ────────────────────────────────────────────────────────────────────────────

/// A contract breach found after decoding. Logged, never fatal: the renderer truncates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    pub field: String,
    pub detail: String,
}

impl SchemaViolation {
    fn count(field: impl Into<String>, bounds: Bounds, actual: usize) -> Self {
        let expected = if bounds.min == bounds.max {
            format!("exactly {}", bounds.min)
        } else {
            format!("{}-{}", bounds.min, bounds.max)
        };
        SchemaViolation {
            field: field.into(),
            detail: format!("expected {expected} items, got {actual}"),
        }
    }

    fn blank(field: impl Into<String>) -> Self {
        SchemaViolation {
            field: field.into(),
            detail: "must not be blank".to_string(),
        }
    }

    pub(crate) fn unknown_field(path: String) -> Self {
        SchemaViolation {
            field: path,
            detail: "not part of the closed schema".to_string(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.detail)
    }
}

fn check_count(out: &mut Vec<SchemaViolation>, field: &str, bounds: Bounds, actual: usize) {
    if !bounds.contains(actual) {
        out.push(SchemaViolation::count(field, bounds, actual));
    }
}

fn check_not_blank(out: &mut Vec<SchemaViolation>, field: String, value: &str) {
    if value.trim().is_empty() {
        out.push(SchemaViolation::blank(field));
    }
}

/// Re-applies the cardinality and non-blank rules of the closed schema to a decoded report.
pub fn check(report: &Report) -> Vec<SchemaViolation> {
    let mut out = Vec::new();

    check_count(&mut out, "summary", SUMMARY, report.summary.len());
    check_count(&mut out, "top_fixes", TOP_FIXES, report.top_fixes.len());
    check_count(&mut out, "ats_checklist", CHECKLIST, report.checklist.len());
    check_count(
        &mut out,
        "suggested_keywords",
        SUGGESTED_KEYWORDS,
        report.suggested_keywords.len(),
    );
    check_count(
        &mut out,
        "rewritten_bullets",
        REWRITTEN_BULLETS,
        report.rewritten_bullets.len(),
    );
    check_count(
        &mut out,
        "template_outline",
        TEMPLATE_OUTLINE,
        report.template_outline.len(),
    );
    check_count(&mut out, "best_matches", BEST_MATCHES, report.best_matches.len());

    for (i, fix) in report.top_fixes.iter().enumerate() {
        check_not_blank(&mut out, format!("top_fixes[{i}].title"), &fix.title);
        check_not_blank(&mut out, format!("top_fixes[{i}].why"), &fix.rationale);
        check_not_blank(&mut out, format!("top_fixes[{i}].example_fix"), &fix.example_text);
    }
    for (i, item) in report.checklist.iter().enumerate() {
        check_not_blank(&mut out, format!("ats_checklist[{i}].item"), &item.label);
    }
    // `original` may legitimately be empty; `improved` may not.
    for (i, pair) in report.rewritten_bullets.iter().enumerate() {
        check_not_blank(&mut out, format!("rewritten_bullets[{i}].improved"), &pair.improved);
    }
    for (i, m) in report.best_matches.iter().enumerate() {
        check_not_blank(&mut out, format!("best_matches[{i}].role"), &m.role);
        check_count(&mut out, &format!("best_matches[{i}].why_fit"), WHY_FIT, m.why_fit.len());
        check_count(
            &mut out,
            &format!("best_matches[{i}].missing_keywords"),
            MISSING_KEYWORDS,
            m.missing_keywords.len(),
        );
        check_count(
            &mut out,
            &format!("best_matches[{i}].recommended_changes"),
            RECOMMENDED_CHANGES,
            m.recommended_changes.len(),
        );
    }

    out
}

/// Lists keys (as dotted paths) that fall outside the closed schema.
pub fn unknown_fields(object: &Map<String, Value>) -> Vec<String> {
    let mut unknown = Vec::new();

    for (key, value) in object {
        if !TOP_LEVEL_FIELDS.contains(&key.as_str()) {
            unknown.push(key.clone());
            continue;
        }
        let Some((_, allowed)) = ITEM_FIELDS.iter().find(|(field, _)| *field == key.as_str()) else {
            continue;
        };
        let Some(items) = value.as_array() else {
            continue;
        };
        for (i, item) in items.iter().enumerate() {
            if let Some(fields) = item.as_object() {
                for name in fields.keys() {
                    if !allowed.contains(&name.as_str()) {
                        unknown.push(format!("{key}[{i}].{name}"));
                    }
                }
            }
        }
    }

    unknown
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
