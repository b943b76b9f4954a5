//! Background coordinator endpoint: toolbar toggle relay, badge state, and
//! the instructional `openDevToolsPanel` reply.

use crate::transport::{
    ContextId, MessageEndpoint, MessageRouter, ScriptInjector, TransportError,
};
use async_trait::async_trait;
use domgrab_core::error::CaptureError;
use domgrab_core::protocol::{BusRequest, BusResponse};
use std::sync::Arc;
use std::time::Duration;

pub const OPEN_DEVTOOLS_NOTE: &str = "Cannot open DevTools programmatically. Please open \
     DevTools manually (F12) and select the domgrab panel.";

/// Toolbar badge, an external collaborator effect. Rendering is out of
/// scope; only the state transitions are specified.
#[async_trait]
pub trait Badge: Send + Sync {
    async fn set_active(&self, active: bool);
    async fn set_error(&self);
}

/// Badge that only logs. Used when no toolbar exists (CLI runs).
pub struct LogBadge;

#[async_trait]
impl Badge for LogBadge {
    async fn set_active(&self, active: bool) {
        tracing::info!(active, "selection badge");
    }
    async fn set_error(&self) {
        tracing::warn!("selection badge set to error state");
    }
}

pub struct BackgroundEndpoint {
    router: MessageRouter,
    injector: Arc<dyn ScriptInjector>,
    badge: Arc<dyn Badge>,
    settle_delay: Duration,
}

impl BackgroundEndpoint {
    pub fn new(
        router: MessageRouter,
        injector: Arc<dyn ScriptInjector>,
        badge: Arc<dyn Badge>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            router,
            injector,
            badge,
            settle_delay,
        }
    }

    /// Toolbar icon click: toggle selection mode in the content script,
    /// injecting it first if the tab has no receiving end yet. Returns the
    /// new selection-mode state.
    pub async fn on_toolbar_click(&self) -> Result<bool, CaptureError> {
        let response = self
            .send_with_inject_retry(BusRequest::ToggleSelectionMode)
            .await;
        match response {
            Ok(BusResponse::Toggle { is_active, .. }) => {
                self.badge.set_active(is_active).await;
                Ok(is_active)
            }
            Ok(other) => Err(CaptureError::Transport(format!(
                "unexpected toggle reply: {:?}",
                other
            ))),
            Err(err) => {
                self.badge.set_error().await;
                Err(err)
            }
        }
    }

    /// Send to the content script; on a missing receiving end, inject the
    /// picker script and retry the original message exactly once after a
    /// brief settle delay. This is the only automatic retry.
    async fn send_with_inject_retry(
        &self,
        request: BusRequest,
    ) -> Result<BusResponse, CaptureError> {
        match self
            .router
            .request(ContextId::ContentScript, request.clone())
            .await
        {
            Ok(response) => Ok(response),
            Err(TransportError::NoReceiver(_)) => {
                tracing::info!(
                    action = request.action(),
                    "content script missing, injecting and retrying"
                );
                self.injector.inject().await?;
                tokio::time::sleep(self.settle_delay).await;
                self.router
                    .request(ContextId::ContentScript, request)
                    .await
                    .map_err(|e| CaptureError::ConnectionUnavailable(e.to_string()))
            }
        }
    }

    /// A navigation resets the tab's selection mode; clear the badge so it
    /// does not go stale.
    pub async fn tab_navigated(&self) {
        self.badge.set_active(false).await;
    }
}

#[async_trait]
impl MessageEndpoint for BackgroundEndpoint {
    async fn handle(&self, request: BusRequest) -> BusResponse {
        match request {
            BusRequest::SelectionMade { new_picker_state } => {
                tracing::debug!(new_picker_state, "selectionMade received");
                self.badge.set_active(new_picker_state).await;
                BusResponse::Ack {}
            }
            BusRequest::OpenDevToolsPanel => BusResponse::PanelHint {
                success: false,
                note: OPEN_DEVTOOLS_NOTE.to_string(),
            },
            other => BusResponse::unhandled(other.action()),
        }
    }
}
