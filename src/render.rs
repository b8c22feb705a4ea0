//! Collaborator seams for rendering.
//!
//! The core never renders anything. It hands a view reference and a fully
//! resolved context to a [`TemplateEngine`], and raw markdown notes to a
//! [`NotesRenderer`]; adapters for Handlebars, Nunjucks, plain HTML or a
//! markdown pipeline live outside this crate.

use crate::error::CompileError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;

/// Renders a view with a resolved context.
#[async_trait]
pub trait TemplateEngine: Send + Sync {
    /// View file extension this engine handles, including the dot.
    fn ext(&self) -> &str;

    async fn render(
        &self,
        view_path: &Path,
        view: &str,
        context: &Map<String, Value>,
    ) -> Result<String, CompileError>;
}

/// Converts raw markdown notes to display markup.
pub trait NotesRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}
