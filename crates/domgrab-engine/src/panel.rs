//! Devtools panel endpoint: the responder side of the coordination protocol.
//!
//! `fetchEventListeners` is answered synchronously with a preliminary
//! placeholder so the message channel never appears to hang; element
//! resolution and the capability probe then run in a spawned task whose
//! result goes back as a separate `eventListenersResult` push.

use crate::config::DebugSettings;
use crate::evaluator::{ElementEvaluator, InspectedWindow};
use crate::fetcher::fetch_listeners;
use crate::transport::{
    ContextId, MessageEndpoint, MessageRouter, ScriptInjector, TransportError,
};
use async_trait::async_trait;
use domgrab_core::error::CaptureError;
use domgrab_core::listener::{ErrorRecord, ListenerOutcome};
use domgrab_core::now_millis;
use domgrab_core::protocol::{BusRequest, BusResponse};
use domgrab_core::selector::{self, SelectorPlan};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct PanelEndpoint {
    window: Arc<dyn InspectedWindow>,
    router: MessageRouter,
    settings: DebugSettings,
}

impl PanelEndpoint {
    pub fn new(
        window: Arc<dyn InspectedWindow>,
        router: MessageRouter,
        settings: DebugSettings,
    ) -> Self {
        Self {
            window,
            router,
            settings,
        }
    }

    /// Resolve the element and fetch its listeners, escalating to exactly
    /// one alternate selector on ElementNotFound when fallbacks are enabled.
    async fn resolve_and_fetch(
        window: &dyn InspectedWindow,
        settings: DebugSettings,
        plan: &SelectorPlan,
    ) -> ListenerOutcome {
        let evaluator = ElementEvaluator::new(window, settings.use_simple_selectors);
        match evaluator.resolve(&plan.primary).await {
            Ok(facts) => {
                let report = fetch_listeners(window, &plan.primary, facts).await;
                ListenerOutcome::Report(Box::new(report))
            }
            Err(CaptureError::ElementNotFound { .. }) if settings.try_fallback_selectors => {
                let Some(alternate) = plan.first_alternate() else {
                    return ListenerOutcome::Failure(ErrorRecord {
                        error: "Element not found".to_string(),
                        note: None,
                    });
                };
                tracing::info!(selector = alternate, "primary selector failed, trying fallback");
                match evaluator.resolve(alternate).await {
                    Ok(facts) => {
                        let mut report = fetch_listeners(window, alternate, facts).await;
                        report.used_fallback = true;
                        report.fallback_selector = Some(alternate.to_string());
                        ListenerOutcome::Report(Box::new(report))
                    }
                    Err(err) => ListenerOutcome::Failure(ErrorRecord {
                        error: err.to_string(),
                        note: None,
                    }),
                }
            }
            Err(err) => {
                if matches!(err, CaptureError::ElementNotFound { .. }) {
                    tracing::info!("primary selector failed, but fallback selectors are disabled");
                }
                ListenerOutcome::Failure(ErrorRecord {
                    error: err.to_string(),
                    note: None,
                })
            }
        }
    }

    fn spawn_final_push(&self, request_id: u64, plan: SelectorPlan) {
        let window = Arc::clone(&self.window);
        let router = self.router.clone();
        let settings = self.settings;
        tokio::spawn(async move {
            let outcome = Self::resolve_and_fetch(window.as_ref(), settings, &plan).await;
            let push = BusRequest::EventListenersResult {
                request_id,
                selector: plan.primary.clone(),
                fallback_selectors: plan.fallbacks.clone(),
                listeners: outcome,
                timestamp: now_millis(),
            };
            match router.request(ContextId::ContentScript, push).await {
                Ok(BusResponse::Push { received: true }) => {
                    tracing::debug!(request_id, "listener result received by content script");
                }
                Ok(other) => {
                    tracing::warn!(request_id, ?other, "unexpected reply to listener push");
                }
                Err(err) => {
                    tracing::warn!(request_id, error = %err, "failed to push listener result");
                }
            }
        });
    }
}

#[async_trait]
impl MessageEndpoint for PanelEndpoint {
    async fn handle(&self, request: BusRequest) -> BusResponse {
        match request {
            BusRequest::CheckDevToolsConnection => BusResponse::Connection {
                connected: true,
                timestamp: now_millis(),
            },
            BusRequest::FetchEventListeners {
                request_id,
                target_element_info,
            } => {
                tracing::debug!(
                    request_id,
                    tag = %target_element_info.tag_name,
                    "listener request received"
                );
                let plan = match selector::build_selectors(&target_element_info) {
                    Ok(plan) => plan,
                    Err(err) => {
                        return BusResponse::Error {
                            error: err.to_string(),
                        };
                    }
                };

                self.spawn_final_push(request_id, plan.clone());

                // Respond immediately so the channel is not left hanging.
                BusResponse::Preliminary {
                    listeners: ListenerOutcome::placeholder(),
                    selector: plan.primary,
                    fallback_selectors: plan.fallbacks,
                    timestamp: now_millis(),
                    preliminary: true,
                }
            }
            other => BusResponse::unhandled(other.action()),
        }
    }
}

/// Panel-side periodic link check against the content script, injecting the
/// picker script when the receiving end is missing. Owns its task; aborted
/// on shutdown or drop.
pub struct ConnectionWatch {
    handle: JoinHandle<()>,
    connected: Arc<AtomicBool>,
}

impl ConnectionWatch {
    pub fn spawn(
        router: MessageRouter,
        injector: Arc<dyn ScriptInjector>,
        period: Duration,
    ) -> Self {
        let connected = Arc::new(AtomicBool::new(false));
        let state = Arc::clone(&connected);
        let handle = tokio::spawn(async move {
            loop {
                let alive = Self::check_once(&router, injector.as_ref()).await;
                state.store(alive, Ordering::Relaxed);
                tokio::time::sleep(period).await;
            }
        });
        Self { handle, connected }
    }

    async fn check_once(router: &MessageRouter, injector: &dyn ScriptInjector) -> bool {
        match router
            .request(ContextId::ContentScript, BusRequest::CheckDevToolsConnection)
            .await
        {
            Ok(BusResponse::Connection { connected, .. }) => connected,
            Ok(_) => true,
            Err(TransportError::NoReceiver(_)) => {
                tracing::info!("content script unreachable, attempting injection");
                if let Err(err) = injector.inject().await {
                    tracing::warn!(error = %err, "content script injection failed");
                    return false;
                }
                matches!(
                    router
                        .request(ContextId::ContentScript, BusRequest::CheckDevToolsConnection)
                        .await,
                    Ok(BusResponse::Connection { connected: true, .. })
                )
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ConnectionWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
