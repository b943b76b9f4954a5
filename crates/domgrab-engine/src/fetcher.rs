//! Listener fetching: capability probe merged with evaluator facts.

use crate::evaluator::InspectedWindow;
use domgrab_core::listener::{CapabilityProbe, ElementFacts, ListenerReport};
use domgrab_core::now_millis;

pub const CAPABILITY_UNAVAILABLE_NOTE: &str = "getEventListeners not available in this context";

/// Fetch delegated listeners for a resolved element and merge them with its
/// inline-handler facts. The capability is only present in a privileged
/// inspector-attached context; its absence yields a note, never a failure.
pub async fn fetch_listeners(
    window: &dyn InspectedWindow,
    expr: &str,
    facts: ElementFacts,
) -> ListenerReport {
    let mut report = ListenerReport::from_facts(facts, now_millis());
    match window.event_listeners(expr).await {
        Ok(CapabilityProbe::Listeners(entries)) => {
            tracing::debug!(selector = expr, types = entries.len(), "listeners retrieved");
            report.listeners = Some(entries);
        }
        Ok(CapabilityProbe::Unavailable) => {
            report.note = Some(CAPABILITY_UNAVAILABLE_NOTE.to_string());
        }
        Err(err) => {
            tracing::warn!(selector = expr, error = %err, "listener capability probe failed");
            report.note = Some(format!("Failed to retrieve event listeners: {}", err));
        }
    }
    report
}
