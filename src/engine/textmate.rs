//! The syntect-backed engine: TextMate grammars in, themed HTML out.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::try_join_all;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet, SyntaxSetBuilder};
use tracing::{debug, info};

use super::{EngineFactory, Highlighter, html};
use crate::config::HighlightConfig;
use crate::consts::PLAIN_TEXT_TAGS;
use crate::error::Error;
use crate::grammar::{Grammar, sublime};
use crate::theme::load_themes;

pub struct TextMateEngine {
    syntaxes: SyntaxSet,
    theme: Theme,
    theme_id: String,
    loaded_themes: Vec<String>,
}

impl TextMateEngine {
    /// Load every configured grammar and theme, then build the syntax set.
    pub async fn build(config: &HighlightConfig) -> Result<Self, Error> {
        let grammars = try_join_all(config.grammars.iter().map(|source| source.load())).await?;
        debug!(count = grammars.len(), "grammars loaded");

        let defaults = ThemeSet::load_defaults();
        let mut themes = load_themes(&config.themes, &defaults).await?;
        let loaded_themes: Vec<String> = themes.keys().cloned().collect();
        let theme = themes
            .remove(&config.theme)
            .ok_or_else(|| Error::ThemeNotLoaded(config.theme.clone()))?;

        let include_defaults = config.include_default_syntaxes;
        let syntaxes = tokio::task::spawn_blocking(move || link(grammars, include_defaults))
            .await
            .map_err(|e| Error::Interrupted {
                task: "syntax linker",
                reason: e.to_string(),
            })??;

        info!(
            theme = %config.theme,
            languages = syntaxes.syntaxes().len(),
            "highlighter ready"
        );
        Ok(Self {
            syntaxes,
            theme,
            theme_id: config.theme.clone(),
            loaded_themes,
        })
    }

    /// Ids of every loaded theme, the rendering one included. Hosts that
    /// hold the concrete engine use it to offer a theme picker.
    pub fn loaded_themes(&self) -> &[String] {
        &self.loaded_themes
    }

    fn find_syntax(&self, lang: &str) -> Option<&SyntaxReference> {
        if PLAIN_TEXT_TAGS.iter().any(|t| t.eq_ignore_ascii_case(lang)) {
            return Some(self.syntaxes.find_syntax_plain_text());
        }
        self.syntaxes.find_syntax_by_token(lang)
    }
}

/// Convert the grammars and link them into one syntax set.
fn link(grammars: Vec<Grammar>, include_defaults: bool) -> Result<SyntaxSet, Error> {
    let mut builder = if include_defaults {
        SyntaxSet::load_defaults_newlines().into_builder()
    } else {
        let mut builder = SyntaxSetBuilder::new();
        builder.add_plain_text_syntax();
        builder
    };

    let mut known_scopes: HashSet<String> = builder
        .syntaxes()
        .iter()
        .map(|s| s.scope.to_string())
        .collect();
    known_scopes.extend(grammars.iter().map(|g| g.scope_name.clone()));

    for grammar in &grammars {
        let definition = sublime::to_syntax_definition(grammar, &known_scopes)?;
        debug!(language = %definition.name, scope = %grammar.scope_name, "grammar converted");
        builder.add(definition);
    }
    Ok(builder.build())
}

impl Highlighter for TextMateEngine {
    fn code_to_html(&self, code: &str, lang: &str) -> Result<String> {
        let syntax = self
            .find_syntax(lang)
            .ok_or_else(|| Error::UnknownLanguage(lang.to_string()))?;
        Ok(html::render(
            code,
            syntax,
            &self.syntaxes,
            &self.theme,
            &self.theme_id,
        )?)
    }

    fn languages(&self) -> Vec<String> {
        self.syntaxes
            .syntaxes()
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    fn theme(&self) -> &str {
        &self.theme_id
    }
}

/// Builds a [`TextMateEngine`] from a [`HighlightConfig`].
pub struct TextMateFactory {
    config: HighlightConfig,
}

impl TextMateFactory {
    pub fn new(config: HighlightConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineFactory for TextMateFactory {
    async fn create(&self) -> Result<Arc<dyn Highlighter>> {
        let engine = TextMateEngine::build(&self.config).await?;
        Ok(Arc::new(engine))
    }
}
