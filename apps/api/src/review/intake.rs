//! Upload guard. Runs before any model call; every rejection is a client error.

use lopdf::Document;
use thiserror::Error;

use crate::models::Language;

/// 5 MiB upload ceiling.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_PAGES: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("No 'cv' file (PDF) was received.")]
    MissingFile,

    #[error("Invalid file: it must be a PDF.")]
    NotPdf,

    #[error("The PDF is too large. Maximum is 5MB.")]
    TooLarge { bytes: usize },

    #[error("Could not read the PDF. Export it again and retry.")]
    Unreadable,

    #[error("Your CV has {pages} pages. Maximum allowed: {MAX_PAGES}.")]
    TooManyPages { pages: usize },
}

impl IntakeError {
    /// User-facing message in the form's language. `Display` is the English text.
    pub fn message(&self, language: Language) -> String {
        match (language, self) {
            (Language::En, _) => self.to_string(),
            (Language::Es, IntakeError::MissingFile) => "No llegó el archivo 'cv' (PDF).".to_string(),
            (Language::Es, IntakeError::NotPdf) => "Archivo inválido: debe ser PDF.".to_string(),
            (Language::Es, IntakeError::TooLarge { .. }) => {
                "El PDF es muy grande. Máximo 5MB.".to_string()
            }
            (Language::Es, IntakeError::Unreadable) => {
                "No pude leer el PDF. Exporta nuevamente y reintenta.".to_string()
            }
            (Language::Es, IntakeError::TooManyPages { pages }) => {
                format!("Tu CV tiene {pages} páginas. Máximo permitido: {MAX_PAGES}.")
            }
        }
    }
}

/// Validates an uploaded résumé and returns its page count.
pub fn validate_upload(
    filename: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<usize, IntakeError> {
    if bytes.is_empty() {
        return Err(IntakeError::MissingFile);
    }

    let declared_pdf = content_type.is_some_and(|ct| ct.eq_ignore_ascii_case("application/pdf"));
    let named_pdf = filename.is_some_and(|name| name.to_ascii_lowercase().ends_with(".pdf"));
    if !declared_pdf && !named_pdf {
        return Err(IntakeError::NotPdf);
    }

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(IntakeError::TooLarge { bytes: bytes.len() });
    }

    let pages = Document::load_mem(bytes)
        .map_err(|e| {
            tracing::debug!("Rejected unreadable PDF: {e}");
            IntakeError::Unreadable
        })?
        .get_pages()
        .len();

    if pages > MAX_PAGES {
        return Err(IntakeError::TooManyPages { pages });
    }

    Ok(pages)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::layout::{pdf::write_pdf, Document, Page, PageGeometry};

    /// A valid PDF with `pages` blank pages.
    pub fn blank_pdf(pages: usize) -> Vec<u8> {
        let doc = Document {
            title: "fixture".to_string(),
            geometry: PageGeometry::A4,
            pages: (0..pages).map(|_| Page::default()).collect(),
        };
        write_pdf(&doc).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::blank_pdf;
    use super::*;

    #[test]
    fn test_accepts_one_and_two_pages() {
        assert_eq!(validate_upload(Some("cv.pdf"), Some("application/pdf"), &blank_pdf(1)), Ok(1));
        assert_eq!(validate_upload(Some("cv.pdf"), None, &blank_pdf(2)), Ok(2));
    }

    #[test]
    fn test_rejects_three_pages() {
        let err = validate_upload(Some("cv.pdf"), Some("application/pdf"), &blank_pdf(3)).unwrap_err();
        assert_eq!(err, IntakeError::TooManyPages { pages: 3 });
        assert_eq!(err.to_string(), "Your CV has 3 pages. Maximum allowed: 2.");
    }

    #[test]
    fn test_messages_follow_language() {
        let err = IntakeError::TooManyPages { pages: 4 };
        assert_eq!(err.message(Language::Es), "Tu CV tiene 4 páginas. Máximo permitido: 2.");
        assert_eq!(err.message(Language::En), "Your CV has 4 pages. Maximum allowed: 2.");
        assert_eq!(IntakeError::NotPdf.message(Language::Es), "Archivo inválido: debe ser PDF.");
    }

    #[test]
    fn test_missing_or_empty_file() {
        assert_eq!(validate_upload(None, None, &[]), Err(IntakeError::MissingFile));
    }

    #[test]
    fn test_type_check_accepts_mime_or_extension() {
        let pdf = blank_pdf(1);
        assert!(validate_upload(Some("CV.PDF"), Some("application/octet-stream"), &pdf).is_ok());
        assert!(validate_upload(Some("upload"), Some("APPLICATION/PDF"), &pdf).is_ok());
        assert_eq!(
            validate_upload(Some("cv.docx"), Some("application/msword"), &pdf),
            Err(IntakeError::NotPdf)
        );
    }

    #[test]
    fn test_oversize_rejected_before_parsing() {
        let big = vec![0u8; MAX_UPLOAD_BYTES + 1];
        assert_eq!(
            validate_upload(Some("cv.pdf"), None, &big),
            Err(IntakeError::TooLarge { bytes: MAX_UPLOAD_BYTES + 1 })
        );
    }

    #[test]
    fn test_garbage_bytes_are_unreadable() {
        assert_eq!(
            validate_upload(Some("cv.pdf"), None, b"definitely not a pdf"),
            Err(IntakeError::Unreadable)
        );
    }
}
