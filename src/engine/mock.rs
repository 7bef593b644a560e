use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use super::{EngineFactory, Highlighter};
use crate::consts::DEFAULT_LANGUAGE;
use crate::error::Error;

/// A scripted engine factory for tests.
///
/// Counts constructions, can hold construction until a gate is opened,
/// and can be told to fail.
#[derive(Default)]
pub struct MockFactory {
    gate: Option<Arc<Notify>>,
    failure: Option<String>,
    builds: AtomicUsize,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construction waits until `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Construction fails as if the grammar were malformed.
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// How many times `create` has been entered.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineFactory for MockFactory {
    async fn create(&self) -> Result<Arc<dyn Highlighter>> {
        let build = self.builds.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(reason) = &self.failure {
            return Err(Error::InvalidGrammar {
                name: DEFAULT_LANGUAGE.to_string(),
                reason: reason.clone(),
            }
            .into());
        }
        Ok(Arc::new(MockHighlighter::new(build)))
    }
}

/// Echoes its input inside a tagged `<pre>`. Knows `moonbit` and `text`.
pub struct MockHighlighter {
    build: usize,
    calls: AtomicUsize,
}

impl MockHighlighter {
    pub fn new(build: usize) -> Self {
        Self {
            build,
            calls: AtomicUsize::new(0),
        }
    }

    /// Which construction produced this handle (1-based).
    pub fn build(&self) -> usize {
        self.build
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Highlighter for MockHighlighter {
    fn code_to_html(&self, code: &str, lang: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.languages().iter().any(|l| l == lang) {
            return Err(Error::UnknownLanguage(lang.to_string()).into());
        }
        Ok(format!(
            "<pre data-lang=\"{lang}\" data-build=\"{}\">{code}</pre>",
            self.build
        ))
    }

    fn languages(&self) -> Vec<String> {
        vec![DEFAULT_LANGUAGE.to_string(), "text".to_string()]
    }

    fn theme(&self) -> &str {
        "mock"
    }
}
