//! Page-local facts gathered synchronously at click time.

use domgrab_core::identity::ElementIdentity;
use serde::{Deserialize, Serialize};

/// One computed-style pair. Order follows the host's enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleProperty {
    pub name: String,
    pub value: String,
}

/// Everything the content script can see about the clicked element without
/// leaving its own context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub identity: ElementIdentity,
    #[serde(rename = "outerHTML")]
    pub outer_html: String,
    #[serde(default)]
    pub computed_style: Vec<StyleProperty>,
    /// `on*` attribute handlers as (event type, handler body) pairs, in
    /// attribute order.
    #[serde(default)]
    pub inline_handlers: Vec<(String, String)>,
}
