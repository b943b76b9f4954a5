//! Two-tier clipboard write evaluated inside the page.
//!
//! The async clipboard capability is tried first; when the host denies it
//! (focus loss, permissions), a hidden text field plus the legacy copy
//! command is the fallback. Both failing is reported as a value, not an
//! error, so the capture still completes.

use async_trait::async_trait;
use chromiumoxide::Page;
use domgrab_engine::orchestrator::{ClipboardOutcome, ClipboardSink};

pub struct PageClipboard {
    page: Page,
}

impl PageClipboard {
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

#[async_trait]
impl ClipboardSink for PageClipboard {
    async fn write(&self, text: &str) -> ClipboardOutcome {
        let text_literal = match serde_json::to_string(text) {
            Ok(literal) => literal,
            Err(e) => return ClipboardOutcome::denied(format!("serialization failed: {}", e)),
        };

        let expression = format!(
            "(async function() {{ \
               var text = {}; \
               if (navigator.clipboard && navigator.clipboard.writeText) {{ \
                 try {{ \
                   await navigator.clipboard.writeText(text); \
                   return {{ success: true, fallback: false }}; \
                 }} catch (e) {{}} \
               }} \
               try {{ \
                 var area = document.createElement('textarea'); \
                 area.value = text; \
                 area.style.position = 'fixed'; \
                 area.style.opacity = '0'; \
                 document.body.appendChild(area); \
                 area.focus(); \
                 area.select(); \
                 var copied = document.execCommand('copy'); \
                 document.body.removeChild(area); \
                 if (copied) return {{ success: true, fallback: true }}; \
                 return {{ success: false, fallback: true, error: 'copy command refused' }}; \
               }} catch (e) {{ \
                 return {{ success: false, fallback: true, error: String(e) }}; \
               }} \
             }})()",
            text_literal
        );

        let params = match chromiumoxide::cdp::js_protocol::runtime::EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
        {
            Ok(params) => params,
            Err(e) => return ClipboardOutcome::denied(e),
        };

        let evaluated = match self.page.evaluate(params).await {
            Ok(remote) => remote.into_value::<ClipboardOutcome>(),
            Err(e) => return ClipboardOutcome::denied(e.to_string()),
        };
        match evaluated {
            Ok(outcome) => outcome,
            Err(e) => ClipboardOutcome::denied(format!("unreadable clipboard result: {}", e)),
        }
    }
}
