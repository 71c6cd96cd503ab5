//! Template engine error types

use thiserror::Error;

/// Template loading and rendering errors
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No page template with this name
    #[error("Template not found: {0}")]
    NotFound(String),

    /// A template failed to parse
    #[error("Failed to load templates: {0}")]
    Load(String),

    /// Rendering failed
    #[error("Template error: {0}")]
    Render(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
