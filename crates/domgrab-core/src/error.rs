/// Error taxonomy for one capture attempt.
///
/// Listener-path failures (`ElementNotFound`, `ConnectionUnavailable`) are
/// recoverable and degrade to note payloads in the final bundle; only
/// markup-capture failures abort a capture, and cleanup runs regardless.
#[derive(thiserror::Error, Debug, Clone)]
pub enum CaptureError {
    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("No selector candidates could be built (empty tag name)")]
    NoCandidates,

    #[error("Connection unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("Clipboard write denied: {0}")]
    ClipboardDenied(String),

    #[error("Unhandled message action: {0}")]
    UnhandledAction(String),

    #[error("Selection mode is not active")]
    SelectionInactive,

    #[error("A capture is already in flight")]
    CaptureInFlight,

    #[error("Evaluation failed: {0}")]
    Eval(String),

    #[error("Page capture failed: {0}")]
    PageCapture(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CaptureError {
    fn from(err: serde_json::Error) -> Self {
        CaptureError::Serialization(err.to_string())
    }
}

impl CaptureError {
    /// Stable string code for logs and error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            CaptureError::ElementNotFound { .. } => "ELEMENT_NOT_FOUND",
            CaptureError::NoCandidates => "NO_CANDIDATES",
            CaptureError::ConnectionUnavailable(_) => "CONNECTION_UNAVAILABLE",
            CaptureError::ClipboardDenied(_) => "CLIPBOARD_DENIED",
            CaptureError::UnhandledAction(_) => "UNHANDLED_ACTION",
            CaptureError::SelectionInactive => "SELECTION_INACTIVE",
            CaptureError::CaptureInFlight => "CAPTURE_IN_FLIGHT",
            CaptureError::Eval(_) => "EVAL_ERROR",
            CaptureError::PageCapture(_) => "PAGE_CAPTURE_ERROR",
            CaptureError::Transport(_) => "TRANSPORT_ERROR",
            CaptureError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the listener path may keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CaptureError::ElementNotFound { .. } | CaptureError::ConnectionUnavailable(_)
        )
    }
}
