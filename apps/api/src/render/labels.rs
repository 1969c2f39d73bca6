//! Per-language copy for the PDF report.

use crate::models::Language;

pub struct Labels {
    pub brand: &'static str,
    pub page: &'static str,
    pub title: &'static str,
    pub generated: &'static str,
    /// chrono format string for the generation date.
    pub date_format: &'static str,
    pub ats_score: &'static str,
    pub diagnosis_strong: &'static str,
    pub diagnosis_good: &'static str,
    pub diagnosis_risk: &'static str,
    pub top_roles: &'static str,
    pub why_fit: &'static str,
    pub missing_keywords: &'static str,
    pub recommended_changes: &'static str,
    pub summary: &'static str,
    pub top_fixes: &'static str,
    pub example: &'static str,
    pub checklist: &'static str,
    pub no_note: &'static str,
    pub suggested_keywords: &'static str,
    pub rewritten_bullets: &'static str,
    pub original: &'static str,
    pub improved: &'static str,
    pub not_detected: &'static str,
    pub outline: &'static str,
}

static ES: Labels = Labels {
    brand: "reviCV",
    page: "Página",
    title: "Revisión de CV",
    generated: "Generado",
    date_format: "%d/%m/%Y",
    ats_score: "ATS Score",
    diagnosis_strong: "Muy sólido. Pulir detalles para maximizar conversión.",
    diagnosis_good: "Bueno, con oportunidades claras de mejora ATS.",
    diagnosis_risk: "Riesgo alto en ATS. Conviene reestructurar y optimizar keywords.",
    top_roles: "Top 3 cargos recomendados",
    why_fit: "Por qué calzas",
    missing_keywords: "Keywords faltantes",
    recommended_changes: "Cambios recomendados",
    summary: "Resumen ejecutivo",
    top_fixes: "Top fixes (prioridad)",
    example: "Ejemplo",
    checklist: "Checklist ATS",
    no_note: "Sin observaciones.",
    suggested_keywords: "Keywords sugeridas",
    rewritten_bullets: "Bullets reescritos",
    original: "Original",
    improved: "Mejorado",
    not_detected: "No detectado en el PDF (posible tabla/imagen/columnas). \
                   Igual te dejamos una propuesta abajo.",
    outline: "Estructura recomendada",
};

static EN: Labels = Labels {
    brand: "reviCV",
    page: "Page",
    title: "Resume Review",
    generated: "Generated",
    date_format: "%m/%d/%Y",
    ats_score: "ATS Score",
    diagnosis_strong: "Very solid. Polish the details to maximise conversion.",
    diagnosis_good: "Good, with clear room for ATS improvement.",
    diagnosis_risk: "High ATS risk. Restructure and optimise keywords.",
    top_roles: "Top 3 recommended roles",
    why_fit: "Why you're a fit",
    missing_keywords: "Missing keywords",
    recommended_changes: "Recommended changes",
    summary: "Executive summary",
    top_fixes: "Top fixes (priority)",
    example: "Example",
    checklist: "ATS Checklist",
    no_note: "No notes.",
    suggested_keywords: "Suggested keywords",
    rewritten_bullets: "Rewritten bullets",
    original: "Original",
    improved: "Improved",
    not_detected: "Not detected in the PDF (tables/images/columns). \
                   We still provide an improved proposal below.",
    outline: "Recommended structure",
};

pub fn labels(language: Language) -> &'static Labels {
    match language {
        Language::Es => &ES,
        Language::En => &EN,
    }
}

impl Labels {
    /// Score band verdict: 85+ strong, 70+ good, otherwise at risk.
    pub fn diagnosis(&self, score: u8) -> &'static str {
        match score {
            85.. => self.diagnosis_strong,
            70..=84 => self.diagnosis_good,
            _ => self.diagnosis_risk,
        }
    }
}
