pub mod html;
pub mod mock;
pub mod textmate;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// The engine handle. Built once, then only asked to convert.
///
/// Conversion is synchronous and must be deterministic: the same code,
/// language and configuration always give the same markup.
pub trait Highlighter: Send + Sync {
    /// Render `code` as HTML using the grammar registered for `lang`.
    fn code_to_html(&self, code: &str, lang: &str) -> Result<String>;

    /// Ids of the languages the engine can highlight.
    fn languages(&self) -> Vec<String>;

    /// Id of the theme every conversion renders with.
    fn theme(&self) -> &str;
}

/// Builds an engine handle. Construction is the only step that suspends
/// (grammar and theme resources may need loading).
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create(&self) -> Result<Arc<dyn Highlighter>>;
}
