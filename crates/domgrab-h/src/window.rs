//! CDP-backed implementation of the privileged evaluation channel.

use async_trait::async_trait;
use chromiumoxide::Page;
use domgrab_core::listener::{CapabilityProbe, ElementFacts, ListenerEntry};
use domgrab_engine::evaluator::{EvalError, InspectedWindow};
use std::time::Duration;

use crate::page::ensure_collector;

/// Default timeout for JavaScript evaluation (10 seconds).
/// This prevents hanging when dialogs (alert/confirm/prompt) block the JS thread.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum retries for context errors during page navigation.
const MAX_CONTEXT_RETRIES: u32 = 10;

/// Delay between retries when context is not found (page navigating).
const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Check if an error indicates the page context is unavailable (e.g., during navigation).
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

pub struct CdpWindow {
    page: Page,
}

impl CdpWindow {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Evaluate an expression to a JSON value, retrying context errors that
    /// occur while the page is navigating.
    async fn evaluate_json(&self, expression: &str) -> Result<serde_json::Value, EvalError> {
        let mut last_error = None;

        for attempt in 0..MAX_CONTEXT_RETRIES {
            ensure_collector(&self.page)
                .await
                .map_err(|e| EvalError::Channel(e.to_string()))?;

            let eval_result =
                tokio::time::timeout(EVAL_TIMEOUT, self.page.evaluate(expression)).await;
            match eval_result {
                Err(_) => {
                    return Err(EvalError::Channel(
                        "Evaluation timed out - possibly blocked by a dialog".to_string(),
                    ));
                }
                Ok(Err(e)) => {
                    let err_str = e.to_string();
                    if is_context_error(&err_str) {
                        tracing::debug!(
                            "context error during evaluation (attempt {}/{}), retrying...",
                            attempt + 1,
                            MAX_CONTEXT_RETRIES
                        );
                        last_error = Some(err_str);
                        tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
                        continue;
                    }
                    return Err(EvalError::Threw(err_str));
                }
                Ok(Ok(remote_object)) => {
                    return remote_object
                        .into_value::<serde_json::Value>()
                        .map_err(|e| EvalError::Channel(format!("Failed to get result: {}", e)));
                }
            }
        }

        Err(EvalError::Channel(last_error.unwrap_or_else(|| {
            "evaluation failed after retries".to_string()
        })))
    }
}

#[async_trait]
impl InspectedWindow for CdpWindow {
    async fn eval_element(&self, expr: &str) -> Result<Option<ElementFacts>, EvalError> {
        // The wrapper distinguishes null, a thrown expression, and facts; a
        // throw inside the selector expression must not kill the channel.
        let wrapped = format!(
            "(function() {{ \
               try {{ \
                 var el = {}; \
                 if (!el) return null; \
                 return window.__domgrab.facts(el); \
               }} catch (e) {{ \
                 return {{ threw: String(e) }}; \
               }} \
             }})()",
            expr
        );

        let value = self.evaluate_json(&wrapped).await?;
        if value.is_null() {
            return Ok(None);
        }
        if let Some(threw) = value.get("threw").and_then(|v| v.as_str()) {
            return Err(EvalError::Threw(threw.to_string()));
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| EvalError::Channel(format!("malformed element facts: {}", e)))
    }

    async fn elements_by_tag(&self, tag: &str) -> Result<Vec<ElementFacts>, EvalError> {
        let expression = format!(
            "Array.from(document.getElementsByTagName('{}')).map(window.__domgrab.facts)",
            tag
        );
        let value = self.evaluate_json(&expression).await?;
        serde_json::from_value(value)
            .map_err(|e| EvalError::Channel(format!("malformed element list: {}", e)))
    }

    async fn event_listeners(&self, expr: &str) -> Result<CapabilityProbe, EvalError> {
        // getEventListeners only exists in the devtools console context; a
        // plain CDP evaluation usually lacks it, which is exactly the
        // degraded path the report note describes.
        let wrapped = format!(
            "(function() {{ \
               if (typeof getEventListeners !== 'function') return {{ unavailable: true }}; \
               try {{ \
                 var el = {}; \
                 if (!el) return {{ threw: 'element resolved to null' }}; \
                 var raw = getEventListeners(el); \
                 var out = []; \
                 Object.keys(raw).forEach(function(type) {{ \
                   out.push({{ \
                     type: type, \
                     handlers: raw[type].map(function(l) {{ \
                       return {{ \
                         useCapture: !!l.useCapture, \
                         passive: !!l.passive, \
                         once: !!l.once \
                       }}; \
                     }}) \
                   }}); \
                 }}); \
                 return {{ listeners: out }}; \
               }} catch (e) {{ \
                 return {{ threw: String(e) }}; \
               }} \
             }})()",
            expr
        );

        let value = self.evaluate_json(&wrapped).await?;
        if value.get("unavailable").is_some() {
            return Ok(CapabilityProbe::Unavailable);
        }
        if let Some(threw) = value.get("threw").and_then(|v| v.as_str()) {
            return Err(EvalError::Threw(threw.to_string()));
        }
        let listeners: Vec<ListenerEntry> = value
            .get("listeners")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| EvalError::Channel(format!("malformed listener list: {}", e)))?
            .unwrap_or_default();
        Ok(CapabilityProbe::Listeners(listeners))
    }
}
