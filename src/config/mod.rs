//! Bootstrap configuration.
//!
//! Everything here is fixed once the engine is built: which themes and
//! grammars get loaded, which theme renders, and the global symbol names.
//! Defaults reproduce the stock MoonBit setup.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::consts::{CONVERTER_SYMBOL, DEFAULT_LANGUAGE, DEFAULT_THEME, READY_SYMBOL};
use crate::grammar::GrammarSource;
use crate::theme::ThemeSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Themes to load. The rendering theme must be one of them.
    pub themes: Vec<ThemeSource>,
    /// Id of the theme used for every conversion.
    pub theme: String,
    pub grammars: Vec<GrammarSource>,
    /// Language used when a request carries no tag.
    pub default_language: String,
    /// Also load syntect's bundled syntaxes (rust, python, ...).
    pub include_default_syntaxes: bool,
    /// Global name the converter is registered under.
    pub converter_symbol: String,
    /// Global name of the host callback signalled once ready.
    pub ready_symbol: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            themes: vec![ThemeSource::Builtin(DEFAULT_THEME.to_string())],
            theme: DEFAULT_THEME.to_string(),
            grammars: vec![GrammarSource::Bundled],
            default_language: DEFAULT_LANGUAGE.to_string(),
            include_default_syntaxes: false,
            converter_symbol: CONVERTER_SYMBOL.to_string(),
            ready_symbol: READY_SYMBOL.to_string(),
        }
    }
}

impl HighlightConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Select `theme` for rendering, loading it as a bundled theme if no
    /// configured source provides it yet.
    pub fn with_theme(mut self, theme: &str) -> Self {
        if !self.themes.iter().any(|t| t.id() == theme) {
            self.themes.push(ThemeSource::Builtin(theme.to_string()));
        }
        self.theme = theme.to_string();
        self
    }
}
