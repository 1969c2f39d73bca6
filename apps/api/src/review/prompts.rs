// Prompts for the ATS review call.

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_FABRICATION};
use crate::models::Language;
use crate::schema::{
    BEST_MATCHES, MISSING_KEYWORDS, RECOMMENDED_CHANGES, REWRITTEN_BULLETS, TOP_FIXES, WHY_FIT,
};

/// Appended on the single retry.
pub const STRICT_RETRY_SUFFIX: &str = "\
    STRICT MODE: your previous answer could not be used. Return ONLY one JSON object that \
    conforms exactly to the schema, with every required field and exact item counts. \
    Non-conforming output will be discarded.";

pub fn build_system_prompt(language: Language, strict: bool) -> String {
    let mut prompt = format!(
        "You are an expert résumé reviewer specialised in Applicant Tracking Systems (ATS).\n\
         Rules:\n\
         - {NO_FABRICATION}\n\
         - Return EXACTLY {fixes} top_fixes, EXACTLY {bullets} rewritten_bullets and EXACTLY {matches} best_matches.\n\
         - Each best_matches entry has {why_min}-{why_max} why_fit items, {kw_min}-{kw_max} missing_keywords \
         and {chg_min}-{chg_max} recommended_changes.\n\
         - ats_checklist[].note is always a string (\"\" when not applicable).\n\
         - rewritten_bullets[].original is always a string. Prefer exact phrases from the Experience \
         section; use \"\" only when no bullet can be identified.\n\
         - Write every human-readable string in {language} only. Do not mix languages.\n\
         - {JSON_ONLY_SYSTEM}",
        fixes = TOP_FIXES.max,
        bullets = REWRITTEN_BULLETS.max,
        matches = BEST_MATCHES.max,
        why_min = WHY_FIT.min,
        why_max = WHY_FIT.max,
        kw_min = MISSING_KEYWORDS.min,
        kw_max = MISSING_KEYWORDS.max,
        chg_min = RECOMMENDED_CHANGES.min,
        chg_max = RECOMMENDED_CHANGES.max,
        language = language.prompt_name(),
    );
    if strict {
        prompt.push('\n');
        prompt.push_str(STRICT_RETRY_SUFFIX);
    }
    prompt
}

pub fn build_user_prompt(target_role: Option<&str>) -> String {
    let target = match target_role.map(str::trim) {
        Some(role) if !role.is_empty() => role.to_string(),
        _ => "Not specified (infer it from the résumé)".to_string(),
    };
    format!(
        "Analyse the attached résumé (PDF, 1-2 pages) and produce an ATS report.\n\
         Target role (optional): {target}.\n\
         Evaluate ATS formatting, sections, keywords, achievements, spelling and clarity. \
         Suggest the {n} roles the candidate fits best.",
        n = BEST_MATCHES.max,
    )
}
