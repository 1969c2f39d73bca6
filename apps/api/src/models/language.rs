use serde::{Deserialize, Serialize};

/// Output language for both the model's report text and the rendered PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    /// Parses the `lang` form value. Unknown tags fall back to the default (Spanish).
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            t if t.starts_with("en") => Language::En,
            _ => Language::Es,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }

    /// Name used inside model instructions.
    pub fn prompt_name(self) -> &'static str {
        match self {
            Language::Es => "Spanish (español neutro)",
            Language::En => "English",
        }
    }

    /// Suggested download filename for the rendered report.
    pub fn report_filename(self) -> &'static str {
        match self {
            Language::Es => "reporte-ats.pdf",
            Language::En => "ats-report.pdf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_variants() {
        assert_eq!(Language::from_tag("en"), Language::En);
        assert_eq!(Language::from_tag(" EN-us "), Language::En);
        assert_eq!(Language::from_tag("es"), Language::Es);
        assert_eq!(Language::from_tag(""), Language::Es);
        assert_eq!(Language::from_tag("fr"), Language::Es);
    }

    #[test]
    fn test_filename_varies_by_language() {
        assert_ne!(
            Language::Es.report_filename(),
            Language::En.report_filename()
        );
        assert!(Language::En.report_filename().ends_with(".pdf"));
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Language::En).unwrap(), "\"en\"");
        let lang: Language = serde_json::from_str("\"es\"").unwrap();
        assert_eq!(lang, Language::Es);
    }
}
