//! Template rendering
//!
//! HTML pages are Tera templates compiled into the binary from `ui/html/`:
//! - `base.html` with the page skeleton
//! - `partials/*.html` included by the skeleton
//! - `pages/*.html`, one per screen, each extending `base.html`
//!
//! A directory on disk can override any embedded template by name.
//! Everything is parsed once at startup; rendering produces a complete
//! `String` before anything is written to the client.

use chrono::{DateTime, Datelike, Utc};
use rust_embed::RustEmbed;
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera, Value};

use crate::models::{Snippet, User};

mod error;

pub use error::TemplateError;

#[derive(RustEmbed)]
#[folder = "ui/html/"]
#[include = "*.html"]
struct EmbeddedTemplates;

/// Layout used by the `human_date` filter, e.g. `02 Jan 2024 at 15:04`
pub const HUMAN_DATE_FORMAT: &str = "%d %b %Y at %H:%M";

/// Data shared by every page
#[derive(Debug, Default, Serialize)]
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub user_name: Option<String>,
    pub snippet: Option<Snippet>,
    pub snippets: Vec<Snippet>,
    /// The form being displayed, serialized with its validation errors
    pub form: Option<serde_json::Value>,
    pub user: Option<User>,
}

impl TemplateData {
    pub fn new() -> Self {
        Self {
            current_year: Utc::now().year(),
            ..Self::default()
        }
    }
}

/// Parsed template set
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Build the engine from the embedded templates, overlaid by the `.html`
    /// files under `override_dir` when given.
    pub fn new(override_dir: Option<&Path>) -> Result<Self, TemplateError> {
        let mut templates: HashMap<String, String> = HashMap::new();

        for name in EmbeddedTemplates::iter() {
            if let Some(file) = EmbeddedTemplates::get(&name) {
                let content = String::from_utf8(file.data.into_owned())
                    .map_err(|e| TemplateError::Load(format!("{}: {}", name, e)))?;
                templates.insert(name.to_string(), content);
            }
        }

        if let Some(dir) = override_dir {
            if dir.is_dir() {
                collect_templates_from_dir(dir, dir, &mut templates)?;
                tracing::info!("Loaded template overrides from {:?}", dir);
            } else {
                tracing::warn!("Template directory {:?} does not exist, using embedded templates", dir);
            }
        }

        Self::from_sources(templates)
    }

    /// Build the engine from `(name, source)` pairs
    pub fn from_sources<I, N, C>(templates: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (N, C)>,
        N: AsRef<str>,
        C: AsRef<str>,
    {
        let mut tera = Tera::default();
        tera.register_filter("human_date", human_date_filter);
        tera.add_raw_templates(templates)
            .map_err(|e| TemplateError::Load(error_chain(&e)))?;

        Ok(Self { tera })
    }

    /// Render a page such as `home.html` (looked up as `pages/home.html`)
    pub fn render(&self, page: &str, context: &TeraContext) -> Result<String, TemplateError> {
        let name = format!("pages/{}", page);
        if !self.tera.get_template_names().any(|n| n == name) {
            return Err(TemplateError::NotFound(page.to_string()));
        }

        self.tera.render(&name, context).map_err(|e| {
            TemplateError::Render(format!("Failed to render '{}': {}", page, error_chain(&e)))
        })
    }

    /// Render a page with [`TemplateData`] as its context
    pub fn render_data(&self, page: &str, data: &TemplateData) -> Result<String, TemplateError> {
        let context = TeraContext::from_serialize(data)
            .map_err(|e| TemplateError::Render(error_chain(&e)))?;
        self.render(page, &context)
    }
}

fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut HashMap<String, String>,
) -> Result<(), TemplateError> {
    for entry in fs::read_dir(current_path)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| TemplateError::Load(format!("{:?} is outside {:?}", path, base_path)))?;
            let name = relative_path.to_string_lossy().replace('\\', "/");
            templates.insert(name, fs::read_to_string(&path)?);
        }
    }

    Ok(())
}

fn error_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Format a timestamp as `02 Jan 2024 at 15:04` in UTC
pub fn human_date(t: &DateTime<Utc>) -> String {
    t.format(HUMAN_DATE_FORMAT).to_string()
}

/// Tera side of [`human_date`]; null or empty input renders as an empty string.
fn human_date_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = match value {
        Value::Null => return Ok(Value::String(String::new())),
        Value::String(s) if s.is_empty() => return Ok(Value::String(String::new())),
        Value::String(s) => s,
        other => {
            return Err(tera::Error::msg(format!(
                "human_date expects a timestamp string, got {}",
                other
            )))
        }
    };

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| tera::Error::msg(format!("human_date: invalid timestamp '{}': {}", raw, e)))?;
    Ok(Value::String(human_date(&parsed.with_timezone(&Utc))))
}

#[cfg(test)]
mod tests;
