//! Review pipeline: upload guard → analysis (with one retry) → HTTP surface.

pub mod analyzer;
pub mod handlers;
pub mod intake;
pub mod prompts;
