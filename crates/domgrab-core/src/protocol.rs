//! Wire messages exchanged over the extension-internal message bus.
//!
//! Every payload is JSON-shaped with an `action` discriminant, matching the
//! message table in the capture protocol: `toggleSelectionMode`,
//! `selectionMade`, `checkDevToolsConnection`, `fetchEventListeners`,
//! `eventListenersResult`, `openDevToolsPanel`.

use crate::identity::ElementIdentity;
use crate::listener::ListenerOutcome;
use serde::{Deserialize, Serialize};

/// Requests routed between the background, content-script and panel
/// contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BusRequest {
    /// background → content script. Flips selection mode.
    ToggleSelectionMode,

    /// content script → background. Sent exactly once per completed or
    /// failed capture attempt.
    #[serde(rename_all = "camelCase")]
    SelectionMade { new_picker_state: bool },

    /// Liveness probe, content script ↔ panel.
    CheckDevToolsConnection,

    /// content script → panel. Answered synchronously with a preliminary
    /// placeholder; the final result follows as `EventListenersResult`.
    #[serde(rename_all = "camelCase")]
    FetchEventListeners {
        request_id: u64,
        target_element_info: ElementIdentity,
    },

    /// panel → content script. The asynchronous final wave, correlated to
    /// the originating `FetchEventListeners` by `request_id`.
    #[serde(rename_all = "camelCase")]
    EventListenersResult {
        request_id: u64,
        selector: String,
        fallback_selectors: Vec<String>,
        listeners: ListenerOutcome,
        timestamp: u64,
    },

    /// content script → background. Extensions cannot open the inspector
    /// programmatically, so the reply is instructional.
    OpenDevToolsPanel,
}

impl BusRequest {
    /// Wire action name, for logs and error payloads.
    pub fn action(&self) -> &'static str {
        match self {
            BusRequest::ToggleSelectionMode => "toggleSelectionMode",
            BusRequest::SelectionMade { .. } => "selectionMade",
            BusRequest::CheckDevToolsConnection => "checkDevToolsConnection",
            BusRequest::FetchEventListeners { .. } => "fetchEventListeners",
            BusRequest::EventListenersResult { .. } => "eventListenersResult",
            BusRequest::OpenDevToolsPanel => "openDevToolsPanel",
        }
    }
}

/// Responses to bus requests. Shapes vary per action, so the enum is
/// untagged; more specific shapes come first for deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BusResponse {
    /// Immediate reply to `fetchEventListeners`; keeps the message channel
    /// from appearing to hang while resolution runs.
    #[serde(rename_all = "camelCase")]
    Preliminary {
        listeners: ListenerOutcome,
        selector: String,
        fallback_selectors: Vec<String>,
        timestamp: u64,
        preliminary: bool,
    },

    /// Reply to `toggleSelectionMode`.
    #[serde(rename_all = "camelCase")]
    Toggle { status: String, is_active: bool },

    /// Reply to `checkDevToolsConnection`.
    Connection { connected: bool, timestamp: u64 },

    /// Reply to the `eventListenersResult` push.
    Push { received: bool },

    /// Reply to `openDevToolsPanel`.
    PanelHint { success: bool, note: String },

    /// Explicit error payload; unrecognized actions are answered with this
    /// rather than silently dropped.
    Error { error: String },

    /// Acknowledgement for fire-and-forget messages (`selectionMade`).
    Ack {},
}

impl BusResponse {
    pub fn unhandled(action: &str) -> Self {
        BusResponse::Error {
            error: format!("Unhandled message action: {}", action),
        }
    }
}
