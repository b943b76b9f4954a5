//! Listener metadata types shared between the panel and picker contexts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Handler attached through an `on*` attribute. Its source is available,
/// unlike delegated listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineHandler {
    pub handler_body: String,
    pub is_inline: bool,
}

impl InlineHandler {
    pub fn new(body: &str) -> Self {
        Self {
            handler_body: body.to_string(),
            is_inline: true,
        }
    }
}

/// Flags reported by the host listener-introspection capability. Handler
/// source code is intentionally not retrievable this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HandlerFlags {
    pub use_capture: bool,
    pub passive: bool,
    pub once: bool,
}

/// All handlers registered for one event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerEntry {
    #[serde(rename = "type")]
    pub event_type: String,
    pub handlers: Vec<HandlerFlags>,
}

/// Structural facts about a resolved element, as returned by the privileged
/// evaluation channel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementFacts {
    pub tag_name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub classes: String,
    #[serde(default)]
    pub inline_events: BTreeMap<String, InlineHandler>,
}

/// Outcome of probing the host listener-introspection capability.
/// Absence is expected outside a privileged inspector context, so it is a
/// value here, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityProbe {
    Listeners(Vec<ListenerEntry>),
    Unavailable,
}

/// Composite listener result for one element: capability output merged with
/// the evaluator's inline-handler facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerReport {
    pub tag_name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub classes: String,
    #[serde(default)]
    pub inline_events: BTreeMap<String, InlineHandler>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listeners: Option<Vec<ListenerEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub used_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_selector: Option<String>,
    pub timestamp: u64,
}

impl ListenerReport {
    pub fn from_facts(facts: ElementFacts, timestamp: u64) -> Self {
        Self {
            tag_name: facts.tag_name,
            id: facts.id,
            classes: facts.classes,
            inline_events: facts.inline_events,
            listeners: None,
            note: None,
            used_fallback: false,
            fallback_selector: None,
            timestamp,
        }
    }
}

/// Degraded-path note record, e.g. "DevTools panel not connected".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerNote {
    pub note: String,
}

impl ListenerNote {
    pub fn new(note: impl Into<String>) -> Self {
        Self { note: note.into() }
    }
}

/// Hard-failure record carried in place of listener data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The `listeners` payload that crosses the context boundary. Placeholders
/// and degraded paths carry notes; the final wave carries a report or an
/// error record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListenerOutcome {
    Report(Box<ListenerReport>),
    Failure(ErrorRecord),
    Notes(Vec<ListenerNote>),
}

impl ListenerOutcome {
    pub fn note(text: impl Into<String>) -> Self {
        ListenerOutcome::Notes(vec![ListenerNote::new(text)])
    }

    pub fn placeholder() -> Self {
        ListenerOutcome::note("Getting listeners, please wait...")
    }
}
