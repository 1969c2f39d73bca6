use std::sync::Arc;

use crate::layout::PageGeometry;
use crate::llm_client::LlmCapability;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no credential is configured; analyses then fail fast.
    pub llm: Option<Arc<dyn LlmCapability>>,
    /// Page size and margins used for the downloadable report.
    pub page: PageGeometry,
}
