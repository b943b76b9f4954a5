//! Cross-context coordinator, picker side.
//!
//! Drives one capture attempt through the protocol states:
//! `Idle -> ConnectionCheck -> (Connected | Disconnected) -> [InjectRetry]
//! -> ListenerRequestSent -> (PreliminaryReceived -> WaitingForFinal ->
//! Resolved) | TimedOut | Failed`.
//!
//! Every leg degrades to a note payload rather than aborting; the capture
//! always completes with *some* listener outcome. Pending final results are
//! tracked in a map keyed by correlation id, resolved either by the panel's
//! `eventListenersResult` push or by the bounded reconciliation wait
//! expiring.

use crate::config::TimingConfig;
use crate::transport::{ContextId, MessageRouter, ScriptInjector, TransportError};
use domgrab_core::identity::ElementIdentity;
use domgrab_core::listener::ListenerOutcome;
use domgrab_core::protocol::{BusRequest, BusResponse};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, oneshot};
use tokio::time::timeout;

pub const NOT_CONNECTED_NOTE: &str = "DevTools panel not connected. Please open DevTools (F12) \
     and select the domgrab panel to capture event listeners.";

/// Liveness of the panel link, as decided by the most recent probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

/// One-shot slots for in-flight listener requests, keyed by correlation id.
#[derive(Default)]
struct PendingResults {
    slots: Mutex<HashMap<u64, oneshot::Sender<ListenerOutcome>>>,
}

impl PendingResults {
    async fn register(&self, id: u64) -> oneshot::Receiver<ListenerOutcome> {
        let (tx, rx) = oneshot::channel();
        self.slots.lock().await.insert(id, tx);
        rx
    }

    async fn resolve(&self, id: u64, outcome: ListenerOutcome) -> bool {
        match self.slots.lock().await.remove(&id) {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    async fn discard(&self, id: u64) {
        self.slots.lock().await.remove(&id);
    }
}

pub struct Coordinator {
    router: MessageRouter,
    injector: Arc<dyn ScriptInjector>,
    timing: TimingConfig,
    pending: PendingResults,
    next_request_id: AtomicU64,
}

impl Coordinator {
    pub fn new(
        router: MessageRouter,
        injector: Arc<dyn ScriptInjector>,
        timing: TimingConfig,
    ) -> Self {
        Self {
            router,
            injector,
            timing,
            pending: PendingResults::default(),
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Liveness probe with the single disconnected-recovery retry: on no
    /// response (or no receiving endpoint), inject the picker script, settle
    /// briefly, and probe exactly once more. No further backoff.
    pub async fn check_connection(&self) -> ConnectionState {
        if self.probe_once().await {
            return ConnectionState::Connected;
        }
        tracing::info!("panel probe failed, injecting picker script and retrying once");
        if let Err(err) = self.injector.inject().await {
            tracing::warn!(error = %err, "picker script injection failed");
            return ConnectionState::Disconnected;
        }
        tokio::time::sleep(self.timing.settle_delay()).await;
        if self.probe_once().await {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    async fn probe_once(&self) -> bool {
        let probe = self
            .router
            .request(ContextId::Panel, BusRequest::CheckDevToolsConnection);
        match timeout(self.timing.probe_timeout(), probe).await {
            Ok(Ok(BusResponse::Connection { connected, .. })) => connected,
            Ok(Ok(other)) => {
                tracing::debug!(?other, "unexpected probe response");
                false
            }
            Ok(Err(TransportError::NoReceiver(_))) => false,
            Err(_elapsed) => {
                tracing::debug!("panel probe timed out");
                false
            }
        }
    }

    /// Request listener data for the clicked element. Returns the final
    /// result when it arrives inside the reconciliation window, otherwise
    /// the preliminary placeholder. Never blocks past the window.
    pub async fn request_listeners(&self, identity: &ElementIdentity) -> ListenerOutcome {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let final_rx = self.pending.register(request_id).await;

        let request = BusRequest::FetchEventListeners {
            request_id,
            target_element_info: identity.clone(),
        };
        let reply = timeout(
            self.timing.final_wait(),
            self.router.request(ContextId::Panel, request),
        )
        .await;

        let preliminary = match reply {
            Err(_elapsed) => {
                self.pending.discard(request_id).await;
                return ListenerOutcome::note(
                    "DevTools response timed out - check DevTools panel is open",
                );
            }
            Ok(Err(err)) => {
                self.pending.discard(request_id).await;
                return ListenerOutcome::note(format!("Error from DevTools: {}", err));
            }
            Ok(Ok(BusResponse::Preliminary {
                listeners,
                preliminary: true,
                ..
            })) => listeners,
            Ok(Ok(BusResponse::Error { error })) => {
                self.pending.discard(request_id).await;
                return ListenerOutcome::note(format!("Error from DevTools: {}", error));
            }
            Ok(Ok(_)) => {
                self.pending.discard(request_id).await;
                return ListenerOutcome::note("Empty response from DevTools panel");
            }
        };

        // Reconciliation: prefer the final wave if it lands in time.
        tracing::debug!(request_id, "preliminary received, waiting for final result");
        match timeout(self.timing.final_wait(), final_rx).await {
            Ok(Ok(final_outcome)) => {
                tracing::debug!(request_id, "final listener result received");
                final_outcome
            }
            Ok(Err(_)) | Err(_) => {
                self.pending.discard(request_id).await;
                tracing::debug!(request_id, "final wait elapsed, placeholder stands");
                preliminary
            }
        }
    }

    /// Deliver the panel's asynchronous final push. Returns false when no
    /// request is waiting (the window already closed), in which case the
    /// push is dropped.
    pub async fn resolve_push(&self, request_id: u64, outcome: ListenerOutcome) -> bool {
        self.pending.resolve(request_id, outcome).await
    }
}
