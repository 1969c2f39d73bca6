// Shared prompt fragments. Each service that calls the model keeps its own
// prompts.rs alongside it; this file holds the cross-cutting pieces.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "\
    You MUST respond with valid JSON only, conforming to the provided schema. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Forbids inventing facts about the candidate.
pub const NO_FABRICATION: &str = "\
    CRITICAL: Do NOT invent data. Never fabricate numbers, employers, dates or results. \
    When a quantitative fact is unknown, use placeholders such as [X], [N] or [%] instead.";
