//! Error taxonomy for the bootstrapper.
//!
//! Public APIs return [`anyhow::Result`]; the variants below travel inside
//! it so callers can `downcast_ref::<Error>()` when they need to tell an
//! initialization failure from a bad conversion request.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A grammar could not be parsed or was rejected by the highlighting library.
    #[error("invalid grammar `{name}`: {reason}")]
    InvalidGrammar { name: String, reason: String },

    /// A bundled theme id that syntect does not ship.
    #[error("unknown theme `{0}`")]
    UnknownTheme(String),

    /// The rendering theme is not one of the themes the engine loaded.
    #[error("theme `{0}` is not among the loaded themes")]
    ThemeNotLoaded(String),

    /// A grammar or theme file could not be read.
    #[error("failed to load {what} from {}", path.display())]
    ResourceLoad {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global symbol that is write-once was already taken.
    #[error("global `{0}` is already defined")]
    AlreadyDefined(String),

    /// No grammar answers to the requested language tag.
    #[error("language `{0}` not found")]
    UnknownLanguage(String),

    /// The engine failed while producing markup.
    #[error("highlighting failed: {0}")]
    Render(String),

    /// A construction task on the blocking pool panicked or was cancelled.
    #[error("{task} did not complete: {reason}")]
    Interrupted { task: &'static str, reason: String },

    /// An operation that needs the engine ran before `initialize()` finished.
    #[error("highlighter is not initialized")]
    NotInitialized,
}

impl Error {
    /// Errors that mean the engine could not be brought up at all.
    pub fn is_initialization_failure(&self) -> bool {
        matches!(
            self,
            Error::InvalidGrammar { .. }
                | Error::UnknownTheme(_)
                | Error::ThemeNotLoaded(_)
                | Error::ResourceLoad { .. }
                | Error::AlreadyDefined(_)
                | Error::Interrupted { .. }
        )
    }
}

impl From<syntect::Error> for Error {
    fn from(e: syntect::Error) -> Self {
        Error::Render(e.to_string())
    }
}
