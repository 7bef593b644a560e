//! The bootstrapper: build the engine, publish the converter, tell the host.
//!
//! ```text
//! initialize()   engine constructed (async) -> converter bound in Globals
//! signal_ready() host callback looked up, polled for, invoked once
//! start()        both, in that order
//! ```
//!
//! The converter is never bound before construction succeeded, and a failed
//! construction leaves `Globals` untouched.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::{OnceCell, watch};
use tracing::info;

use crate::config::HighlightConfig;
use crate::consts::resolve_language;
use crate::engine::textmate::TextMateFactory;
use crate::engine::{EngineFactory, Highlighter};
use crate::error::Error;
use crate::events::{Event, EventBus};
use crate::globals::{Converter, Globals, ReadyCallback};
use crate::handshake::{Handshake, ReadyState, Ticker, YieldTicker};

pub struct Bootstrapper {
    factory: Arc<dyn EngineFactory>,
    globals: Arc<Globals>,
    converter_symbol: String,
    default_language: String,
    engine: OnceCell<Arc<dyn Highlighter>>,
    handshake: Handshake,
    events: EventBus,
    ready: watch::Sender<bool>,
}

impl Bootstrapper {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        globals: Arc<Globals>,
        config: &HighlightConfig,
    ) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            factory,
            globals,
            converter_symbol: config.converter_symbol.clone(),
            default_language: config.default_language.clone(),
            engine: OnceCell::new(),
            handshake: Handshake::new(&config.ready_symbol),
            events: EventBus::default(),
            ready,
        }
    }

    /// A bootstrapper backed by the syntect engine built from `config`.
    pub fn from_config(config: HighlightConfig, globals: Arc<Globals>) -> Self {
        let factory = Arc::new(TextMateFactory::new(config.clone()));
        Self::new(factory, globals, &config)
    }

    pub fn globals(&self) -> &Arc<Globals> {
        &self.globals
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn converter_symbol(&self) -> &str {
        &self.converter_symbol
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.initialized()
    }

    /// The engine handle, once constructed.
    pub fn engine(&self) -> Option<Arc<dyn Highlighter>> {
        self.engine.get().cloned()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.handshake.state()
    }

    /// Construct the engine and bind the converter.
    ///
    /// Concurrent and repeated calls share one construction and return the
    /// same handle. A failed construction propagates and leaves nothing
    /// registered; a later call starts a fresh attempt.
    pub async fn initialize(&self) -> Result<Arc<dyn Highlighter>> {
        let engine = self.engine.get_or_try_init(|| self.construct()).await?;
        Ok(Arc::clone(engine))
    }

    async fn construct(&self) -> Result<Arc<dyn Highlighter>> {
        let engine = self
            .factory
            .create()
            .await
            .context("failed to construct highlighter")?;

        let converter = converter_for(Arc::clone(&engine), self.default_language.clone());
        self.globals
            .define_converter(&self.converter_symbol, converter)?;
        self.events.emit(Event::EngineReady {
            theme: engine.theme().to_string(),
            languages: engine.languages(),
        });
        info!("injected {}", self.converter_symbol);
        self.events.emit(Event::ConverterRegistered {
            symbol: self.converter_symbol.clone(),
        });
        self.ready.send_replace(true);
        Ok(engine)
    }

    /// Convert with the constructed engine. A missing or blank `lang` means
    /// the default language.
    pub fn convert(&self, code: &str, lang: Option<&str>) -> Result<String> {
        let engine = self.engine.get().ok_or(Error::NotInitialized)?;
        engine.code_to_html(code, resolve_language(lang, &self.default_language))
    }

    /// Invoke the host callback once it is registered, ticking in between.
    ///
    /// Returns the ticks waited, or `None` if the host was already
    /// signalled. Must run after [`initialize`](Self::initialize).
    pub async fn signal_ready(&self, ticker: &dyn Ticker) -> Result<Option<usize>> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized.into());
        }
        let signalled = self.handshake.run(&self.globals, ticker).await;
        if let Some(ticks) = signalled {
            self.events.emit(Event::HostSignalled {
                symbol: self.handshake.symbol().to_string(),
                ticks,
            });
        }
        Ok(signalled)
    }

    /// `initialize()` then `signal_ready()`, yielding to the scheduler
    /// between checks.
    pub async fn start(&self) -> Result<()> {
        self.initialize().await?;
        self.signal_ready(&YieldTicker).await?;
        Ok(())
    }

    /// Resolves once the converter is bound. For hosts that would rather
    /// wait than be called back.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Register the host callback explicitly. Runs it right away if the
    /// handshake has already found a callback (`Ready` or `Done`).
    pub fn on_ready(&self, callback: ReadyCallback) {
        if self.handshake.state() != ReadyState::Waiting {
            callback();
            return;
        }
        self.globals.set_callback(self.handshake.symbol(), callback);
    }
}

fn converter_for(engine: Arc<dyn Highlighter>, default_language: String) -> Converter {
    Arc::new(move |code: &str, lang: Option<&str>| -> Result<String> {
        engine.code_to_html(code, resolve_language(lang, &default_language))
    })
}
