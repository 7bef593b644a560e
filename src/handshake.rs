//! Readiness handshake with a host that may not be up yet.
//!
//! The host's callback is looked up by name in [`Globals`]. If it is not
//! there, the handshake yields to the scheduler through a [`Ticker`] and
//! looks again, until it shows up:
//!
//! ```text
//! WAITING --callback found--> READY --callback returned--> DONE
//!    ^  |
//!    +--+ tick
//! ```
//!
//! DONE is terminal. The callback fires at most once per handshake no
//! matter how many times or from where it is driven.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

use crate::globals::Globals;

/// Roughly one display frame.
pub const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Callback not registered yet.
    Waiting,
    /// Callback found and being invoked.
    Ready,
    /// Callback invoked.
    Done,
}

/// One scheduling opportunity. The handshake awaits a tick between checks.
#[async_trait]
pub trait Ticker: Send + Sync {
    async fn tick(&self);
}

/// Yields one turn of the tokio scheduler per tick.
pub struct YieldTicker;

#[async_trait]
impl Ticker for YieldTicker {
    async fn tick(&self) {
        tokio::task::yield_now().await;
    }
}

/// Sleeps a fixed period per tick, like polling once per frame.
pub struct IntervalTicker {
    period: Duration,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new(FRAME)
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&self) {
        tokio::time::sleep(self.period).await;
    }
}

pub struct Handshake {
    symbol: String,
    state: Mutex<ReadyState>,
}

impl Handshake {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            state: Mutex::new(ReadyState::Waiting),
        }
    }

    /// Name of the host callback this handshake signals.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn state(&self) -> ReadyState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check once. Invokes the callback if it is registered and this
    /// handshake has not fired yet. Never suspends.
    pub fn check(&self, globals: &Globals) -> ReadyState {
        match self.step(globals) {
            Step::Waiting => ReadyState::Waiting,
            Step::Fired => ReadyState::Done,
            Step::Settled(state) => state,
        }
    }

    fn step(&self, globals: &Globals) -> Step {
        let callback = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != ReadyState::Waiting {
                return Step::Settled(*state);
            }
            match globals.callback(&self.symbol) {
                Some(callback) => {
                    *state = ReadyState::Ready;
                    callback
                }
                None => return Step::Waiting,
            }
        };

        // Lock released: the callback may inspect this handshake.
        callback();
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = ReadyState::Done;
        info!(symbol = %self.symbol, "host signalled");
        Step::Fired
    }

    /// Check, tick, check again... until the callback has been taken care
    /// of. Returns the number of ticks waited when this call invoked the
    /// callback (0: it was already registered and ran without yielding),
    /// `None` when it had already been invoked elsewhere.
    pub async fn run(&self, globals: &Globals, ticker: &dyn Ticker) -> Option<usize> {
        let mut ticks = 0;
        loop {
            match self.step(globals) {
                Step::Fired => return Some(ticks),
                Step::Settled(_) => return None,
                Step::Waiting if ticks == 0 => {
                    debug!(symbol = %self.symbol, "host callback not registered yet, polling");
                }
                Step::Waiting => {}
            }
            ticker.tick().await;
            ticks += 1;
        }
    }
}

enum Step {
    Waiting,
    Fired,
    /// Ready (another driver is invoking it) or Done.
    Settled(ReadyState),
}
