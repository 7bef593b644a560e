use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use moonlight::consts::READY_SYMBOL;
use moonlight::engine::mock::MockFactory;
use moonlight::handshake::{ReadyState, Ticker, YieldTicker};
use moonlight::{Bootstrapper, Globals, HighlightConfig};

/// Registers the host callback on its `at`-th tick, as a late host would.
struct LateHost {
    globals: Arc<Globals>,
    at: usize,
    ticks: AtomicUsize,
    hits: Arc<AtomicUsize>,
}

impl LateHost {
    fn new(globals: Arc<Globals>, at: usize) -> Self {
        Self {
            globals,
            at,
            ticks: AtomicUsize::new(0),
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ticker for LateHost {
    async fn tick(&self) {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        if tick == self.at {
            let hits = Arc::clone(&self.hits);
            self.globals.set_callback(
                READY_SYMBOL,
                Arc::new(move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }
        tokio::task::yield_now().await;
    }
}

async fn initialized(globals: Arc<Globals>) -> Bootstrapper {
    let b = Bootstrapper::new(
        Arc::new(MockFactory::new()),
        globals,
        &HighlightConfig::default(),
    );
    b.initialize().await.unwrap();
    b
}

#[tokio::test]
async fn late_callback_fires_on_the_tick_it_appears() {
    let globals = Arc::new(Globals::new());
    let b = initialized(Arc::clone(&globals)).await;
    let host = LateHost::new(globals, 5);

    let ticks = b.signal_ready(&host).await.unwrap();

    assert_eq!(ticks, Some(5));
    assert_eq!(host.ticks(), 5);
    assert_eq!(host.hits(), 1);
    assert_eq!(b.ready_state(), ReadyState::Done);
}

#[tokio::test]
async fn registered_callback_fires_without_ticking() {
    let globals = Arc::new(Globals::new());
    let b = initialized(Arc::clone(&globals)).await;
    let host = LateHost::new(Arc::clone(&globals), 1);
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    globals.set_callback(
        READY_SYMBOL,
        Arc::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }),
    );

    assert_eq!(b.signal_ready(&host).await.unwrap(), Some(0));
    assert_eq!(host.ticks(), 0);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn callback_runs_once_across_signals() {
    let globals = Arc::new(Globals::new());
    let b = initialized(Arc::clone(&globals)).await;
    let host = LateHost::new(globals, 2);

    assert_eq!(b.signal_ready(&host).await.unwrap(), Some(2));
    assert_eq!(b.signal_ready(&host).await.unwrap(), None);
    assert_eq!(b.signal_ready(&YieldTicker).await.unwrap(), None);
    assert_eq!(host.hits(), 1);
}

#[tokio::test]
async fn concurrent_drivers_fire_once() {
    let globals = Arc::new(Globals::new());
    let b = initialized(Arc::clone(&globals)).await;
    let host = LateHost::new(globals, 3);

    let (left, right) = tokio::join!(b.signal_ready(&host), b.signal_ready(&host));
    let outcomes = [left.unwrap(), right.unwrap()];

    assert_eq!(outcomes.iter().filter(|o| o.is_some()).count(), 1);
    assert_eq!(host.hits(), 1);
}

#[tokio::test]
async fn callback_sees_converter_registered() {
    let globals = Arc::new(Globals::new());
    let seen = Arc::new(AtomicUsize::new(0));
    let (g, s) = (Arc::clone(&globals), Arc::clone(&seen));
    globals.set_callback(
        READY_SYMBOL,
        Arc::new(move || {
            if g.has_converter(moonlight::consts::CONVERTER_SYMBOL) {
                s.fetch_add(1, Ordering::SeqCst);
            }
        }),
    );
    let b = Bootstrapper::new(
        Arc::new(MockFactory::new()),
        globals,
        &HighlightConfig::default(),
    );

    b.start().await.unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn custom_ready_symbol() {
    let globals = Arc::new(Globals::new());
    let config = HighlightConfig {
        ready_symbol: "hostUp".to_string(),
        ..HighlightConfig::default()
    };
    let b = Bootstrapper::new(Arc::new(MockFactory::new()), Arc::clone(&globals), &config);
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    globals.set_callback(
        "hostUp",
        Arc::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }),
    );

    b.start().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
