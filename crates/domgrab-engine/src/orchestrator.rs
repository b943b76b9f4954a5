//! Capture orchestrator, content-script side.
//!
//! One end-to-end click capture:
//! `ArmedForClick -> Capturing -> Assembling -> ClipboardWrite ->
//! Deactivated`. Listener data never blocks the capture; markup/style
//! failures abort it; deactivation and the `selectionMade` notification run
//! unconditionally on every path.

use crate::bundle::{self, BundleContext};
use crate::config::{CaptureLimits, DomgrabConfig};
use crate::coordinator::{Coordinator, NOT_CONNECTED_NOTE};
use crate::scripts::{self, ScriptTag};
use crate::snapshot::ElementSnapshot;
use crate::transport::{ContextId, MessageEndpoint, MessageRouter, ScriptInjector};
use async_trait::async_trait;
use domgrab_core::error::CaptureError;
use domgrab_core::listener::ListenerOutcome;
use domgrab_core::now_millis;
use domgrab_core::protocol::{BusRequest, BusResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of the two-tier clipboard write: host clipboard capability first,
/// then the hidden-text-field legacy copy command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardOutcome {
    pub success: bool,
    #[serde(default)]
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClipboardOutcome {
    pub fn copied() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn copied_via_fallback() -> Self {
        Self {
            success: true,
            fallback: true,
            error: None,
        }
    }

    pub fn denied(error: impl Into<String>) -> Self {
        Self {
            success: false,
            fallback: true,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait ClipboardSink: Send + Sync {
    async fn write(&self, text: &str) -> ClipboardOutcome;
}

/// Transient on-page notification boundary. No modal interruption.
#[async_trait]
pub trait ToastNotifier: Send + Sync {
    async fn show(&self, message: &str);
}

/// Toast that only logs; the CLI has no page to draw on.
pub struct LogToast;

#[async_trait]
impl ToastNotifier for LogToast {
    async fn show(&self, message: &str) {
        tracing::info!(toast = message, "notification");
    }
}

/// Page-local fact gathering for the clicked element. Failures here are the
/// only ones that abort a capture.
#[async_trait]
pub trait PageProbe: Send + Sync {
    async fn snapshot(&self) -> Result<ElementSnapshot, CaptureError>;
    async fn scripts(&self) -> Result<Vec<ScriptTag>, CaptureError>;
}

#[derive(Debug)]
pub struct CaptureSummary {
    pub bundle: String,
    pub devtools_connected: bool,
    pub listeners: ListenerOutcome,
    pub clipboard: ClipboardOutcome,
}

#[derive(Default)]
struct SessionState {
    selection_active: bool,
    capturing: bool,
}

/// Per-context session object holding all previously-global picker state:
/// selection mode, the pending-result map (via the coordinator), and the
/// collaborator boundaries. Created on context load, reset per attempt,
/// dropped on unload.
pub struct PickerSession {
    router: MessageRouter,
    coordinator: Coordinator,
    clipboard: Arc<dyn ClipboardSink>,
    toast: Arc<dyn ToastNotifier>,
    limits: CaptureLimits,
    state: Mutex<SessionState>,
}

impl PickerSession {
    pub fn new(
        router: MessageRouter,
        injector: Arc<dyn ScriptInjector>,
        clipboard: Arc<dyn ClipboardSink>,
        toast: Arc<dyn ToastNotifier>,
        config: &DomgrabConfig,
    ) -> Self {
        Self {
            coordinator: Coordinator::new(router.clone(), injector, config.timing),
            router,
            clipboard,
            toast,
            limits: config.capture,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub async fn is_selection_active(&self) -> bool {
        self.state.lock().await.selection_active
    }

    /// Flip selection mode, returning the new state.
    pub async fn toggle_selection(&self) -> bool {
        let mut state = self.state.lock().await;
        state.selection_active = !state.selection_active;
        tracing::info!(active = state.selection_active, "selection mode toggled");
        state.selection_active
    }

    /// Handle one intercepted click. The capture replaces the default click
    /// action; whatever happens, selection mode deactivates exactly once and
    /// the background coordinator is notified.
    pub async fn handle_click(
        &self,
        page: &dyn PageProbe,
    ) -> Result<CaptureSummary, CaptureError> {
        {
            let mut state = self.state.lock().await;
            if !state.selection_active {
                return Err(CaptureError::SelectionInactive);
            }
            if state.capturing {
                return Err(CaptureError::CaptureInFlight);
            }
            state.capturing = true;
        }

        let result = self.capture(page).await;
        if let Err(err) = &result {
            self.toast
                .show(&format!("Error during data capture: {}", err))
                .await;
        }
        self.finish_attempt().await;
        result
    }

    async fn capture(&self, page: &dyn PageProbe) -> Result<CaptureSummary, CaptureError> {
        // Liveness first; failure is non-fatal and only degrades listener
        // data.
        let connection = self.coordinator.check_connection().await;
        if !connection.is_connected() {
            match self
                .router
                .request(ContextId::Background, BusRequest::OpenDevToolsPanel)
                .await
            {
                Ok(BusResponse::PanelHint { note, .. }) => self.toast.show(&note).await,
                _ => {
                    self.toast
                        .show("Please open DevTools (F12) and select the domgrab panel")
                        .await
                }
            }
        }

        let snapshot = page.snapshot().await?;
        if snapshot.outer_html.trim().is_empty() {
            return Err(CaptureError::PageCapture("serialized markup is empty".into()));
        }
        let page_scripts = page.scripts().await?;
        let survey = scripts::survey(
            &page_scripts,
            &snapshot.identity,
            self.limits.max_inline_script_len,
        );

        let listeners = if connection.is_connected() {
            self.coordinator.request_listeners(&snapshot.identity).await
        } else {
            ListenerOutcome::note(NOT_CONNECTED_NOTE)
        };

        let bundle = bundle::render(&BundleContext {
            snapshot: &snapshot,
            survey: &survey,
            listeners: &listeners,
            devtools_connected: connection.is_connected(),
            timestamp: now_millis(),
        });

        let clipboard = self.clipboard.write(&bundle).await;
        if clipboard.success {
            if clipboard.fallback {
                self.toast
                    .show("Snippet copied to clipboard (fallback method)")
                    .await;
            } else {
                self.toast.show("Snippet copied to clipboard!").await;
            }
        } else {
            let reason = clipboard.error.as_deref().unwrap_or("Unknown error");
            self.toast
                .show(&format!("Error copying to clipboard: {}", reason))
                .await;
        }

        Ok(CaptureSummary {
            bundle,
            devtools_connected: connection.is_connected(),
            listeners,
            clipboard,
        })
    }

    /// The sole guaranteed terminal action: deactivate selection mode and
    /// tell the background coordinator, regardless of which step failed.
    async fn finish_attempt(&self) {
        {
            let mut state = self.state.lock().await;
            state.selection_active = false;
            state.capturing = false;
        }
        let notify = self
            .router
            .request(
                ContextId::Background,
                BusRequest::SelectionMade {
                    new_picker_state: false,
                },
            )
            .await;
        if let Err(err) = notify {
            tracing::warn!(error = %err, "failed to notify background of deactivation");
        }
    }

    /// Enrich a final push the way the click handler expects to read it:
    /// failures gain an explanatory note, fallback successes record the
    /// selector that worked.
    fn decorate_push(outcome: ListenerOutcome) -> ListenerOutcome {
        match outcome {
            ListenerOutcome::Failure(mut record) => {
                record.note = Some(
                    "Error retrieving event listeners. This might happen if the element \
                     cannot be found or if DevTools is not in the right context."
                        .to_string(),
                );
                ListenerOutcome::Failure(record)
            }
            ListenerOutcome::Report(mut report) if report.used_fallback => {
                let selector = report
                    .fallback_selector
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string());
                let extra = format!("Retrieved listeners using fallback selector: {}", selector);
                report.note = Some(match report.note.take() {
                    Some(existing) => format!("{} {}", existing, extra),
                    None => extra,
                });
                ListenerOutcome::Report(report)
            }
            other => other,
        }
    }
}

#[async_trait]
impl MessageEndpoint for PickerSession {
    async fn handle(&self, request: BusRequest) -> BusResponse {
        match request {
            BusRequest::ToggleSelectionMode => {
                let is_active = self.toggle_selection().await;
                BusResponse::Toggle {
                    status: "selectionModeToggled".to_string(),
                    is_active,
                }
            }
            BusRequest::CheckDevToolsConnection => BusResponse::Connection {
                connected: true,
                timestamp: now_millis(),
            },
            BusRequest::EventListenersResult {
                request_id,
                listeners,
                ..
            } => {
                let delivered = self
                    .coordinator
                    .resolve_push(request_id, Self::decorate_push(listeners))
                    .await;
                if !delivered {
                    tracing::debug!(request_id, "listener push arrived after the wait closed");
                }
                BusResponse::Push { received: true }
            }
            other => {
                tracing::debug!(action = other.action(), "unhandled message action");
                BusResponse::unhandled(other.action())
            }
        }
    }
}
