//! Page-side collector: injection and the page-local fact probes.

use async_trait::async_trait;
use chromiumoxide::Page;
use domgrab_core::error::CaptureError;
use domgrab_engine::orchestrator::PageProbe;
use domgrab_engine::scripts::ScriptTag;
use domgrab_engine::snapshot::ElementSnapshot;
use domgrab_engine::transport::ScriptInjector;
use std::error::Error;

const COLLECTOR_JS: &str = include_str!("collector.js");

/// Inject the collector if the page does not already carry it. Idempotent;
/// every evaluation path calls this first because a navigation discards the
/// previous copy.
pub async fn ensure_collector(page: &Page) -> Result<(), Box<dyn Error + Send + Sync>> {
    let is_loaded: bool = page
        .evaluate("typeof window.__domgrab !== 'undefined'")
        .await
        .map_err(|e| format!("Failed to check collector status: {}", e))?
        .into_value()
        .map_err(|e| format!("Failed to get bool value: {}", e))?;

    if !is_loaded {
        page.evaluate(COLLECTOR_JS)
            .await
            .map_err(|e| format!("Failed to inject collector: {}", e))?;
    }

    Ok(())
}

/// `ScriptInjector` backed by the real page. The bus coordinator calls this
/// when a context reports no receiver, mirroring a cold content script.
pub struct CollectorInjector {
    page: Page,
}

impl CollectorInjector {
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

#[async_trait]
impl ScriptInjector for CollectorInjector {
    async fn inject(&self) -> Result<(), CaptureError> {
        ensure_collector(&self.page)
            .await
            .map_err(|e| CaptureError::Eval(e.to_string()))
    }
}

/// Page-local fact gathering for one selector, evaluated in the page itself.
pub struct CdpPageProbe {
    page: Page,
    selector: String,
}

impl CdpPageProbe {
    pub fn new(page: Page, selector: impl Into<String>) -> Self {
        Self {
            page,
            selector: selector.into(),
        }
    }

    async fn evaluate_json(&self, expression: &str) -> Result<serde_json::Value, CaptureError> {
        ensure_collector(&self.page)
            .await
            .map_err(|e| CaptureError::Eval(e.to_string()))?;
        self.page
            .evaluate(expression)
            .await
            .map_err(|e| CaptureError::Eval(e.to_string()))?
            .into_value::<serde_json::Value>()
            .map_err(|e| CaptureError::Eval(format!("Failed to get result: {}", e)))
    }
}

#[async_trait]
impl PageProbe for CdpPageProbe {
    async fn snapshot(&self) -> Result<ElementSnapshot, CaptureError> {
        let selector_literal = serde_json::to_string(&self.selector)?;
        let value = self
            .evaluate_json(&format!("window.__domgrab.snapshot({})", selector_literal))
            .await?;

        if let Some(error) = value.get("error").and_then(|v| v.as_str()) {
            return Err(CaptureError::PageCapture(error.to_string()));
        }
        serde_json::from_value(value).map_err(CaptureError::from)
    }

    async fn scripts(&self) -> Result<Vec<ScriptTag>, CaptureError> {
        let value = self.evaluate_json("window.__domgrab.scripts()").await?;
        serde_json::from_value(value).map_err(CaptureError::from)
    }
}
