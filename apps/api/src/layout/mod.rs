// Pagination layout engine: font metrics, word-wrap, cursor composer, PDF writer.
// Composition is CPU-bound; callers on the async runtime use tokio::task::spawn_blocking.

pub mod composer;
pub mod font_metrics;
pub mod page;
pub mod pdf;
pub mod wrap;

// Re-export the public API consumed by the renderer and handlers.
pub use composer::{Composer, TextStyle};
pub use page::{Document, DrawOp, Page, PageGeometry, Rgb};
