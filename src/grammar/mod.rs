//! TextMate grammars: the serde model, the bundled MoonBit grammar, and
//! where grammars come from.
//!
//! The model only covers the keys the converter in [`sublime`] understands.
//! Unknown keys (`$schema`, `uuid`, `information_for_contributors`, ...) are
//! ignored.

pub mod sublime;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The MoonBit grammar, baked in at build time.
pub const MOONBIT_GRAMMAR: &str = include_str!("../../grammars/moonbit.tmLanguage.json");

/// A TextMate grammar document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Grammar {
    /// Language id. Falls back to the last segment of `scope_name`.
    pub name: Option<String>,
    pub scope_name: String,
    pub file_types: Vec<String>,
    /// Extra tags the language answers to.
    pub aliases: Vec<String>,
    pub first_line_match: Option<String>,
    pub patterns: Vec<Rule>,
    pub repository: BTreeMap<String, Rule>,
}

/// One entry of a `patterns` list or of the repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rule {
    pub include: Option<String>,
    pub name: Option<String>,
    pub content_name: Option<String>,
    #[serde(rename = "match")]
    pub regex: Option<String>,
    pub begin: Option<String>,
    pub end: Option<String>,
    #[serde(rename = "while")]
    pub while_regex: Option<String>,
    pub captures: Option<Captures>,
    pub begin_captures: Option<Captures>,
    pub end_captures: Option<Captures>,
    pub patterns: Vec<Rule>,
    pub apply_end_pattern_last: Option<Flag>,
    pub disabled: Option<Flag>,
}

/// Capture index (as written in the grammar, e.g. `"1"`) to capture rule.
pub type Captures = BTreeMap<String, Capture>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capture {
    pub name: Option<String>,
    /// Nested patterns inside a capture. Not supported by the converter.
    pub patterns: Vec<Rule>,
}

/// Grammars write booleans both as `true` and as `1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    pub fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(n) => n != 0,
        }
    }
}

impl Rule {
    pub fn is_disabled(&self) -> bool {
        self.disabled.is_some_and(Flag::is_set)
    }

    pub fn applies_end_last(&self) -> bool {
        self.apply_end_pattern_last.is_some_and(Flag::is_set)
    }
}

impl Grammar {
    /// Parse a grammar from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let grammar: Grammar = serde_json::from_str(json).map_err(|e| Error::InvalidGrammar {
            name: "<unparsed>".to_string(),
            reason: e.to_string(),
        })?;
        if grammar.scope_name.trim().is_empty() {
            return Err(Error::InvalidGrammar {
                name: grammar.id(),
                reason: "missing scopeName".to_string(),
            });
        }
        Ok(grammar)
    }

    /// The bundled MoonBit grammar.
    pub fn moonbit() -> Result<Self, Error> {
        Self::from_json(MOONBIT_GRAMMAR)
    }

    /// The id the language is registered under.
    pub fn id(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .scope_name
                .rsplit('.')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Tags other than the id that should resolve to this grammar.
    pub fn extra_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.file_types.iter().chain(self.aliases.iter()) {
            let tag = tag.trim_start_matches('.').to_string();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }
}

/// Where a grammar comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarSource {
    /// The MoonBit grammar shipped in the binary.
    Bundled,
    /// A `.tmLanguage.json` file on disk.
    File(PathBuf),
    /// Grammar JSON held in memory.
    Inline(String),
}

impl GrammarSource {
    pub async fn load(&self) -> Result<Grammar, Error> {
        match self {
            GrammarSource::Bundled => Grammar::moonbit(),
            GrammarSource::Inline(json) => Grammar::from_json(json),
            GrammarSource::File(path) => {
                let json = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| Error::ResourceLoad {
                        what: "grammar",
                        path: path.clone(),
                        source,
                    })?;
                Grammar::from_json(&json).map_err(|e| match e {
                    Error::InvalidGrammar { name, reason } => Error::InvalidGrammar {
                        name,
                        reason: format!("{reason} (in {})", path.display()),
                    },
                    other => other,
                })
            }
        }
    }
}
