use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

use moonlight::consts::{CONVERTER_SYMBOL, READY_SYMBOL};
use moonlight::engine::mock::MockFactory;
use moonlight::events::Event;
use moonlight::handshake::ReadyState;
use moonlight::{Bootstrapper, Error, Globals, HighlightConfig};

fn bootstrapper(factory: Arc<MockFactory>, globals: Arc<Globals>) -> Arc<Bootstrapper> {
    Arc::new(Bootstrapper::new(factory, globals, &HighlightConfig::default()))
}

async fn entered(factory: &MockFactory) {
    while factory.builds() == 0 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn converter_absent_until_engine_constructed() {
    let gate = Arc::new(Notify::new());
    let factory = Arc::new(MockFactory::gated(Arc::clone(&gate)));
    let globals = Arc::new(Globals::new());
    let b = bootstrapper(Arc::clone(&factory), Arc::clone(&globals));

    let init = tokio::spawn({
        let b = Arc::clone(&b);
        async move { b.initialize().await.map(|_| ()) }
    });
    entered(&factory).await;

    assert!(!globals.has_converter(CONVERTER_SYMBOL));
    assert!(!b.is_initialized());

    gate.notify_one();
    init.await.unwrap().unwrap();

    assert!(globals.has_converter(CONVERTER_SYMBOL));
    let convert = globals.converter(CONVERTER_SYMBOL).unwrap();
    assert_eq!(
        convert("let x = 1", None).unwrap(),
        "<pre data-lang=\"moonbit\" data-build=\"1\">let x = 1</pre>"
    );
}

#[tokio::test]
async fn concurrent_initialize_builds_once() {
    let gate = Arc::new(Notify::new());
    let factory = Arc::new(MockFactory::gated(Arc::clone(&gate)));
    let globals = Arc::new(Globals::new());
    let b = bootstrapper(Arc::clone(&factory), Arc::clone(&globals));

    let first = tokio::spawn({
        let b = Arc::clone(&b);
        async move { b.initialize().await.map(|e| e.code_to_html("a", "moonbit")) }
    });
    let second = tokio::spawn({
        let b = Arc::clone(&b);
        async move { b.initialize().await.map(|e| e.code_to_html("a", "moonbit")) }
    });
    entered(&factory).await;
    gate.notify_one();

    let first = first.await.unwrap().unwrap().unwrap();
    let second = second.await.unwrap().unwrap().unwrap();

    assert_eq!(factory.builds(), 1);
    assert_eq!(first, second);
    assert!(first.contains("data-build=\"1\""));
}

#[tokio::test]
async fn repeated_initialize_returns_same_engine() {
    let factory = Arc::new(MockFactory::new());
    let b = bootstrapper(Arc::clone(&factory), Arc::new(Globals::new()));

    b.initialize().await.unwrap();
    let again = b.initialize().await.unwrap();

    assert_eq!(factory.builds(), 1);
    assert!(again.code_to_html("x", "text").unwrap().contains("data-build=\"1\""));
}

#[tokio::test]
async fn failed_construction_registers_nothing() {
    let factory = Arc::new(MockFactory::failing("unterminated group"));
    let globals = Arc::new(Globals::new());
    let b = bootstrapper(Arc::clone(&factory), Arc::clone(&globals));

    let err = b.initialize().await.err().unwrap();
    let cause = err.downcast_ref::<Error>().unwrap();
    assert!(cause.is_initialization_failure());
    assert!(err.to_string().contains("failed to construct highlighter"));

    assert!(!globals.has_converter(CONVERTER_SYMBOL));
    assert!(!b.is_initialized());
    assert!(b.start().await.is_err());
    assert_eq!(factory.builds(), 2);
}

#[tokio::test]
async fn taken_symbol_fails_initialize() {
    let globals = Arc::new(Globals::new());
    globals
        .define_converter(
            CONVERTER_SYMBOL,
            Arc::new(|_: &str, _: Option<&str>| -> anyhow::Result<String> { Ok(String::new()) }),
        )
        .unwrap();
    let b = bootstrapper(Arc::new(MockFactory::new()), globals);
    let mut rx = b.events().subscribe();

    let err = b.initialize().await.err().unwrap();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::AlreadyDefined(symbol)) if symbol == CONVERTER_SYMBOL
    ));
    // No milestone is reported for an engine that never got published.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn unknown_language_is_not_an_initialization_failure() {
    let b = bootstrapper(Arc::new(MockFactory::new()), Arc::new(Globals::new()));
    b.initialize().await.unwrap();

    let err = b.convert("x", Some("cobol")).unwrap_err();
    let cause = err.downcast_ref::<Error>().unwrap();
    assert!(matches!(cause, Error::UnknownLanguage(lang) if lang == "cobol"));
    assert!(!cause.is_initialization_failure());
}

#[tokio::test]
async fn start_emits_milestones_in_order() {
    let globals = Arc::new(Globals::new());
    globals.set_callback(READY_SYMBOL, Arc::new(|| {}));
    let b = bootstrapper(Arc::new(MockFactory::new()), globals);
    let mut rx = b.events().subscribe();

    b.start().await.unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        Event::EngineReady {
            theme: "mock".to_string(),
            languages: vec!["moonbit".to_string(), "text".to_string()],
        }
    );
    assert_eq!(
        rx.recv().await.unwrap(),
        Event::ConverterRegistered {
            symbol: CONVERTER_SYMBOL.to_string(),
        }
    );
    assert_eq!(
        rx.recv().await.unwrap(),
        Event::HostSignalled {
            symbol: READY_SYMBOL.to_string(),
            ticks: 0,
        }
    );
    assert_eq!(b.ready_state(), ReadyState::Done);
}

#[tokio::test]
async fn wait_ready_resolves_after_initialize() {
    let gate = Arc::new(Notify::new());
    let factory = Arc::new(MockFactory::gated(Arc::clone(&gate)));
    let globals = Arc::new(Globals::new());
    let b = bootstrapper(Arc::clone(&factory), Arc::clone(&globals));

    let waiter = tokio::spawn({
        let b = Arc::clone(&b);
        async move {
            b.wait_ready().await;
            b.globals().has_converter(CONVERTER_SYMBOL)
        }
    });
    let init = tokio::spawn({
        let b = Arc::clone(&b);
        async move { b.initialize().await.map(|_| ()) }
    });
    entered(&factory).await;
    assert!(!waiter.is_finished());

    gate.notify_one();
    init.await.unwrap().unwrap();
    assert!(waiter.await.unwrap());
}

#[tokio::test]
async fn on_ready_before_start_is_signalled_by_start() {
    let b = bootstrapper(Arc::new(MockFactory::new()), Arc::new(Globals::new()));
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    b.on_ready(Arc::new(move || {
        h.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    b.start().await.unwrap();
    b.start().await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
