//! Element resolution inside the inspected page.
//!
//! Direct evaluation of a selector expression comes first. When that throws
//! or yields null and the permissive simple-selector mode is enabled, a
//! best-effort tier runs: scan all elements of the tag for a class-attribute
//! *substring* match (tolerating framework-generated hashed suffixes such as
//! `Header_nav__xyz123`), then retry with the prefix before the first `_`
//! delimiter, then settle for the first element of that tag.

use async_trait::async_trait;
use domgrab_core::error::CaptureError;
use domgrab_core::listener::{CapabilityProbe, ElementFacts};
use domgrab_core::selector;

#[derive(thiserror::Error, Debug, Clone)]
pub enum EvalError {
    /// The evaluated expression threw inside the page.
    #[error("evaluation threw: {0}")]
    Threw(String),

    /// The evaluation channel itself is broken (context destroyed, page
    /// gone). Not recoverable by trying another selector.
    #[error("evaluation channel unavailable: {0}")]
    Channel(String),
}

/// Privileged expression-evaluation channel into the inspected page. Only
/// the panel context holds one; implementations live in `domgrab-h` (CDP)
/// and in test mocks.
#[async_trait]
pub trait InspectedWindow: Send + Sync {
    /// Evaluate a selector expression. `Ok(None)` means it resolved to null.
    async fn eval_element(&self, expr: &str) -> Result<Option<ElementFacts>, EvalError>;

    /// All elements of a tag name, in document order.
    async fn elements_by_tag(&self, tag: &str) -> Result<Vec<ElementFacts>, EvalError>;

    /// Probe the host listener-introspection capability for the element the
    /// expression resolves to.
    async fn event_listeners(&self, expr: &str) -> Result<CapabilityProbe, EvalError>;
}

pub struct ElementEvaluator<'w> {
    window: &'w dyn InspectedWindow,
    simple_selectors: bool,
}

impl<'w> ElementEvaluator<'w> {
    pub fn new(window: &'w dyn InspectedWindow, simple_selectors: bool) -> Self {
        Self {
            window,
            simple_selectors,
        }
    }

    /// Resolve one selector expression to element facts. `ElementNotFound`
    /// is recoverable; the caller may retry with the next fallback selector.
    pub async fn resolve(&self, expr: &str) -> Result<ElementFacts, CaptureError> {
        match self.window.eval_element(expr).await {
            Ok(Some(facts)) => return Ok(facts),
            Ok(None) => {
                tracing::debug!(selector = expr, "direct evaluation resolved to null");
            }
            Err(EvalError::Threw(err)) => {
                tracing::debug!(selector = expr, error = %err, "direct evaluation threw");
            }
            Err(EvalError::Channel(err)) => return Err(CaptureError::Eval(err)),
        }

        if !self.simple_selectors {
            return Err(CaptureError::ElementNotFound {
                selector: expr.to_string(),
            });
        }
        self.resolve_permissive(expr).await
    }

    async fn resolve_permissive(&self, expr: &str) -> Result<ElementFacts, CaptureError> {
        let Some((tag, class_hint)) = selector::selector_parts(expr) else {
            return Err(CaptureError::ElementNotFound {
                selector: expr.to_string(),
            });
        };

        let all = self
            .window
            .elements_by_tag(&tag)
            .await
            .map_err(|e| CaptureError::Eval(e.to_string()))?;
        tracing::debug!(tag = %tag, count = all.len(), "permissive tier scanning by tag");

        if let Some(class) = class_hint.as_deref() {
            if let Some(facts) = all.iter().find(|f| f.classes.contains(class)) {
                tracing::debug!(class = %class, "matched by class substring");
                return Ok(facts.clone());
            }
            // Hashed suffixes: "Header_nav__xy12" still matches on "Header".
            if let Some((prefix, _)) = class.split_once('_')
                && !prefix.is_empty()
                && let Some(facts) = all.iter().find(|f| f.classes.contains(prefix))
            {
                tracing::debug!(prefix = %prefix, "matched by class prefix");
                return Ok(facts.clone());
            }
        }

        all.first().cloned().ok_or(CaptureError::ElementNotFound {
            selector: expr.to_string(),
        })
    }
}
