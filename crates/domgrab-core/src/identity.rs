use serde::{Deserialize, Serialize};

/// Class attribute as captured at click time.
///
/// HTML elements expose `className` as a plain string; SVG elements expose an
/// `SVGAnimatedString` whose effective value lives in `baseVal`. Both forms
/// cross the context boundary unchanged and are normalized on the receiving
/// side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassAttr {
    Svg {
        #[serde(rename = "baseVal")]
        base_val: String,
    },
    Text(String),
}

impl ClassAttr {
    pub fn raw(&self) -> &str {
        match self {
            ClassAttr::Text(s) => s,
            ClassAttr::Svg { base_val } => base_val,
        }
    }

    /// Whitespace-split class list, trimmed, empty entries discarded.
    pub fn names(&self) -> Vec<String> {
        self.raw()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.raw().trim().is_empty()
    }
}

impl Default for ClassAttr {
    fn default() -> Self {
        ClassAttr::Text(String::new())
    }
}

impl From<&str> for ClassAttr {
    fn from(s: &str) -> Self {
        ClassAttr::Text(s.to_string())
    }
}

/// Minimal serializable description of a DOM element, captured once in the
/// page context at click time. DOM node references cannot cross execution
/// contexts, so this is the sole handle passed between them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementIdentity {
    pub tag_name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub classes: ClassAttr,
}

impl ElementIdentity {
    pub fn new(tag_name: &str, id: &str, classes: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            id: id.to_string(),
            classes: ClassAttr::Text(classes.to_string()),
        }
    }

    /// Lowercased tag name as used in selector expressions.
    pub fn tag(&self) -> String {
        self.tag_name.to_lowercase()
    }
}
