pub mod bootstrap;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod events;
pub mod globals;
pub mod grammar;
pub mod handshake;
pub mod logging;
pub mod theme;

pub use bootstrap::Bootstrapper;
pub use config::HighlightConfig;
pub use error::Error;
pub use globals::{Converter, Globals, ReadyCallback};
