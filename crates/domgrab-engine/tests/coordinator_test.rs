use async_trait::async_trait;
use domgrab_core::error::CaptureError;
use domgrab_core::identity::ElementIdentity;
use domgrab_core::listener::{ElementFacts, ListenerOutcome, ListenerReport};
use domgrab_core::now_millis;
use domgrab_core::protocol::{BusRequest, BusResponse};
use domgrab_engine::config::TimingConfig;
use domgrab_engine::coordinator::{ConnectionState, Coordinator};
use domgrab_engine::transport::{ContextId, MessageEndpoint, MessageRouter, ScriptInjector};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Injector that counts calls and optionally registers an endpoint,
/// simulating a successful script injection restoring the link.
struct CountingInjector {
    calls: AtomicUsize,
    router: MessageRouter,
    restores: Option<Arc<dyn MessageEndpoint>>,
}

impl CountingInjector {
    fn new(router: MessageRouter, restores: Option<Arc<dyn MessageEndpoint>>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            router,
            restores,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptInjector for CountingInjector {
    async fn inject(&self) -> Result<(), CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(endpoint) = &self.restores {
            self.router
                .register(ContextId::Panel, Arc::clone(endpoint))
                .await;
        }
        Ok(())
    }
}

/// Panel stub answering connection probes and listener requests.
struct StubPanel {
    answer_delay: Duration,
    listener_reply: Option<BusResponse>,
}

impl StubPanel {
    fn live() -> Arc<Self> {
        Arc::new(Self {
            answer_delay: Duration::ZERO,
            listener_reply: None,
        })
    }

    fn with_preliminary() -> Arc<Self> {
        Arc::new(Self {
            answer_delay: Duration::ZERO,
            listener_reply: Some(BusResponse::Preliminary {
                listeners: ListenerOutcome::placeholder(),
                selector: "document.getElementById('x')".to_string(),
                fallback_selectors: vec!["document.getElementById('x')".to_string()],
                timestamp: now_millis(),
                preliminary: true,
            }),
        })
    }
}

#[async_trait]
impl MessageEndpoint for StubPanel {
    async fn handle(&self, request: BusRequest) -> BusResponse {
        if !self.answer_delay.is_zero() {
            tokio::time::sleep(self.answer_delay).await;
        }
        match request {
            BusRequest::CheckDevToolsConnection => BusResponse::Connection {
                connected: true,
                timestamp: now_millis(),
            },
            BusRequest::FetchEventListeners { .. } => self
                .listener_reply
                .clone()
                .unwrap_or_else(|| BusResponse::unhandled("fetchEventListeners")),
            other => BusResponse::unhandled(other.action()),
        }
    }
}

fn identity() -> ElementIdentity {
    ElementIdentity::new("button", "x", "")
}

fn final_report() -> ListenerOutcome {
    let facts = ElementFacts {
        tag_name: "BUTTON".to_string(),
        id: "x".to_string(),
        ..ElementFacts::default()
    };
    ListenerOutcome::Report(Box::new(ListenerReport::from_facts(facts, now_millis())))
}

#[tokio::test(start_paused = true)]
async fn probe_succeeds_without_injection() {
    let router = MessageRouter::new();
    router.register(ContextId::Panel, StubPanel::live()).await;
    let injector = Arc::new(CountingInjector::new(router.clone(), None));
    let coordinator = Coordinator::new(router, Arc::clone(&injector) as Arc<dyn ScriptInjector>, TimingConfig::default());

    assert_eq!(coordinator.check_connection().await, ConnectionState::Connected);
    assert_eq!(injector.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_panel_triggers_exactly_one_inject_retry() {
    let router = MessageRouter::new();
    let restored: Arc<dyn MessageEndpoint> = StubPanel::live();
    let injector = Arc::new(CountingInjector::new(router.clone(), Some(restored)));
    let coordinator =
        Coordinator::new(router, Arc::clone(&injector) as Arc<dyn ScriptInjector>, TimingConfig::default());

    assert_eq!(coordinator.check_connection().await, ConnectionState::Connected);
    assert_eq!(injector.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_retry_settles_on_disconnected() {
    let router = MessageRouter::new();
    let injector = Arc::new(CountingInjector::new(router.clone(), None));
    let coordinator =
        Coordinator::new(router, Arc::clone(&injector) as Arc<dyn ScriptInjector>, TimingConfig::default());

    assert_eq!(
        coordinator.check_connection().await,
        ConnectionState::Disconnected
    );
    // No backoff loop: exactly one injection attempt per check.
    assert_eq!(injector.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unresponsive_panel_counts_as_disconnected() {
    let router = MessageRouter::new();
    let slow = Arc::new(StubPanel {
        answer_delay: Duration::from_secs(30),
        listener_reply: None,
    });
    router.register(ContextId::Panel, slow).await;
    let injector = Arc::new(CountingInjector::new(router.clone(), None));
    let coordinator =
        Coordinator::new(router, Arc::clone(&injector) as Arc<dyn ScriptInjector>, TimingConfig::default());

    assert_eq!(
        coordinator.check_connection().await,
        ConnectionState::Disconnected
    );
}

#[tokio::test(start_paused = true)]
async fn final_push_inside_the_window_wins() {
    let router = MessageRouter::new();
    router
        .register(ContextId::Panel, StubPanel::with_preliminary())
        .await;
    let injector = Arc::new(CountingInjector::new(router.clone(), None));
    let coordinator = Arc::new(Coordinator::new(
        router,
        injector,
        TimingConfig::default(),
    ));

    // First request mints correlation id 1; deliver its final result while
    // the reconciliation window is still open.
    let pusher = Arc::clone(&coordinator);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(pusher.resolve_push(1, final_report()).await);
    });

    let outcome = coordinator.request_listeners(&identity()).await;
    let ListenerOutcome::Report(report) = outcome else {
        panic!("expected the final report, got {:?}", outcome);
    };
    assert_eq!(report.id, "x");
}

#[tokio::test(start_paused = true)]
async fn placeholder_stands_when_no_final_arrives() {
    let router = MessageRouter::new();
    router
        .register(ContextId::Panel, StubPanel::with_preliminary())
        .await;
    let injector = Arc::new(CountingInjector::new(router.clone(), None));
    let coordinator = Coordinator::new(router, injector, TimingConfig::default());

    let outcome = coordinator.request_listeners(&identity()).await;
    assert_eq!(outcome, ListenerOutcome::placeholder());
}

#[tokio::test(start_paused = true)]
async fn late_push_is_dropped() {
    let router = MessageRouter::new();
    router
        .register(ContextId::Panel, StubPanel::with_preliminary())
        .await;
    let injector = Arc::new(CountingInjector::new(router.clone(), None));
    let coordinator = Coordinator::new(router, injector, TimingConfig::default());

    let _ = coordinator.request_listeners(&identity()).await;
    // The window for request 1 already closed.
    assert!(!coordinator.resolve_push(1, final_report()).await);
}

#[tokio::test(start_paused = true)]
async fn missing_panel_degrades_to_a_note() {
    let router = MessageRouter::new();
    let injector = Arc::new(CountingInjector::new(router.clone(), None));
    let coordinator = Coordinator::new(router, injector, TimingConfig::default());

    let outcome = coordinator.request_listeners(&identity()).await;
    let ListenerOutcome::Notes(notes) = outcome else {
        panic!("expected a degraded note");
    };
    assert!(notes[0].note.starts_with("Error from DevTools:"));
}

#[tokio::test(start_paused = true)]
async fn panel_error_reply_degrades_to_a_note() {
    let router = MessageRouter::new();
    let erroring = Arc::new(StubPanel {
        answer_delay: Duration::ZERO,
        listener_reply: Some(BusResponse::Error {
            error: "No selector candidates could be built (empty tag name)".to_string(),
        }),
    });
    router.register(ContextId::Panel, erroring).await;
    let injector = Arc::new(CountingInjector::new(router.clone(), None));
    let coordinator = Coordinator::new(router, injector, TimingConfig::default());

    let outcome = coordinator.request_listeners(&identity()).await;
    let ListenerOutcome::Notes(notes) = outcome else {
        panic!("expected a degraded note");
    };
    assert!(notes[0].note.contains("empty tag name"));
}
