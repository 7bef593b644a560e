//! TextMate grammar -> `sublime-syntax`, the format syntect loads.
//!
//! Mapping:
//! - top-level `patterns` become the `main` context
//! - repository entries become contexts named `repository.{key}`
//! - `begin`/`end` pushes an anonymous context whose first pattern pops on `end`
//!   (last when `applyEndPatternLast` is set); `name`/`contentName` become
//!   `meta_scope`/`meta_content_scope`
//! - pattern-only groups are flattened into the enclosing list
//! - `while` rules have no counterpart and are dropped

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use syntect::parsing::SyntaxDefinition;
use tracing::{debug, warn};

use super::{Captures, Grammar, Rule};
use crate::error::Error;

const REPOSITORY_PREFIX: &str = "repository.";

#[derive(Debug, Serialize)]
struct SublimeSyntax {
    name: String,
    scope: String,
    file_extensions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_line_match: Option<String>,
    contexts: BTreeMap<String, Vec<Item>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Item {
    MetaScope { meta_scope: String },
    MetaContentScope { meta_content_scope: String },
    Include { include: String },
    Match(MatchItem),
}

#[derive(Debug, Serialize)]
struct MatchItem {
    #[serde(rename = "match")]
    regex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    captures: BTreeMap<u32, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    push: Option<Vec<Item>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pop: bool,
}

impl MatchItem {
    fn new(regex: &str) -> Self {
        Self {
            regex: regex.to_string(),
            scope: None,
            captures: BTreeMap::new(),
            push: None,
            pop: false,
        }
    }
}

/// Walks one grammar. `known_scopes` holds every scope name that will be
/// in the final syntax set; includes pointing elsewhere are dropped.
struct Converter<'a> {
    grammar: &'a Grammar,
    known_scopes: &'a HashSet<String>,
    dropped: usize,
}

impl Converter<'_> {
    fn rules(&mut self, rules: &[Rule], out: &mut Vec<Item>) {
        for rule in rules {
            self.rule(rule, out);
        }
    }

    fn rule(&mut self, rule: &Rule, out: &mut Vec<Item>) {
        if rule.is_disabled() {
            return;
        }

        if let Some(include) = &rule.include {
            match self.include_target(include) {
                Some(target) => out.push(Item::Include { include: target }),
                None => {
                    warn!(
                        grammar = %self.grammar.id(),
                        include = %include,
                        "dropping unresolved include"
                    );
                    self.dropped += 1;
                }
            }
            return;
        }

        if let Some(regex) = &rule.regex {
            out.push(Item::Match(MatchItem {
                scope: scope_of(&rule.name),
                captures: captures_of(rule.captures.as_ref()),
                ..MatchItem::new(regex)
            }));
            return;
        }

        if let Some(begin) = &rule.begin {
            if rule.while_regex.is_some() {
                warn!(
                    grammar = %self.grammar.id(),
                    begin = %begin,
                    "begin/while rules are not supported"
                );
                self.dropped += 1;
                return;
            }
            let Some(end) = &rule.end else {
                warn!(grammar = %self.grammar.id(), begin = %begin, "begin rule without end");
                self.dropped += 1;
                return;
            };

            let mut context = Vec::new();
            if let Some(meta_scope) = scope_of(&rule.name) {
                context.push(Item::MetaScope { meta_scope });
            }
            if let Some(meta_content_scope) = scope_of(&rule.content_name) {
                context.push(Item::MetaContentScope { meta_content_scope });
            }

            let pop = Item::Match(MatchItem {
                captures: captures_of(rule.end_captures.as_ref().or(rule.captures.as_ref())),
                pop: true,
                ..MatchItem::new(end)
            });
            let mut inner = Vec::new();
            self.rules(&rule.patterns, &mut inner);
            if rule.applies_end_last() {
                context.extend(inner);
                context.push(pop);
            } else {
                context.push(pop);
                context.extend(inner);
            }

            out.push(Item::Match(MatchItem {
                captures: captures_of(rule.begin_captures.as_ref().or(rule.captures.as_ref())),
                push: Some(context),
                ..MatchItem::new(begin)
            }));
            return;
        }

        self.rules(&rule.patterns, out);
    }

    fn include_target(&self, include: &str) -> Option<String> {
        match include {
            "$self" | "$base" => Some("main".to_string()),
            local if local.starts_with('#') => {
                let key = &local[1..];
                self.grammar
                    .repository
                    .contains_key(key)
                    .then(|| format!("{REPOSITORY_PREFIX}{key}"))
            }
            external => {
                let (scope, key) = match external.split_once('#') {
                    Some((scope, key)) => (scope, Some(key)),
                    None => (external, None),
                };
                if !self.known_scopes.contains(scope) {
                    return None;
                }
                if scope == self.grammar.scope_name {
                    return match key {
                        Some(key) => self
                            .grammar
                            .repository
                            .contains_key(key)
                            .then(|| format!("{REPOSITORY_PREFIX}{key}")),
                        None => Some("main".to_string()),
                    };
                }
                // Repository keys of other TextMate grammars carry the same prefix.
                Some(match key {
                    Some(key) => format!("scope:{scope}#{REPOSITORY_PREFIX}{key}"),
                    None => format!("scope:{scope}"),
                })
            }
        }
    }
}

fn scope_of(name: &Option<String>) -> Option<String> {
    name.as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn captures_of(captures: Option<&Captures>) -> BTreeMap<u32, String> {
    let mut out = BTreeMap::new();
    let Some(captures) = captures else {
        return out;
    };
    for (index, capture) in captures {
        let Ok(index) = index.parse::<u32>() else {
            debug!(index = %index, "ignoring non-numeric capture");
            continue;
        };
        if !capture.patterns.is_empty() {
            debug!(index, "capture patterns are not supported, keeping the name only");
        }
        if let Some(scope) = scope_of(&capture.name) {
            out.insert(index, scope);
        }
    }
    out
}

/// Render a grammar as `sublime-syntax` YAML.
pub fn to_sublime_syntax(
    grammar: &Grammar,
    known_scopes: &HashSet<String>,
) -> Result<String, Error> {
    let mut converter = Converter {
        grammar,
        known_scopes,
        dropped: 0,
    };

    let mut contexts = BTreeMap::new();
    let mut main = Vec::new();
    converter.rules(&grammar.patterns, &mut main);
    contexts.insert("main".to_string(), main);

    for (key, rule) in &grammar.repository {
        let mut items = Vec::new();
        converter.rule(rule, &mut items);
        contexts.insert(format!("{REPOSITORY_PREFIX}{key}"), items);
    }

    if converter.dropped > 0 {
        debug!(
            grammar = %grammar.id(),
            dropped = converter.dropped,
            "converted with dropped rules"
        );
    }

    let syntax = SublimeSyntax {
        name: grammar.id(),
        scope: grammar.scope_name.clone(),
        file_extensions: grammar.extra_tags(),
        first_line_match: grammar.first_line_match.clone(),
        contexts,
    };
    serde_yaml::to_string(&syntax).map_err(|e| Error::InvalidGrammar {
        name: grammar.id(),
        reason: e.to_string(),
    })
}

/// Convert a grammar into a syntect definition. Regexes are compiled here,
/// so a bad pattern surfaces as [`Error::InvalidGrammar`] before the engine
/// is built.
pub fn to_syntax_definition(
    grammar: &Grammar,
    known_scopes: &HashSet<String>,
) -> Result<SyntaxDefinition, Error> {
    let yaml = to_sublime_syntax(grammar, known_scopes)?;
    let id = grammar.id();
    SyntaxDefinition::load_from_str(&yaml, true, Some(&id)).map_err(|e| Error::InvalidGrammar {
        name: id.clone(),
        reason: e.to_string(),
    })
}
