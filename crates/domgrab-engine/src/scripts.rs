//! Script-source survey: classify every script element on the page and pick
//! out the ones plausibly related to the clicked element.
//!
//! Relevance is a substring heuristic over the element's id, class names and
//! tag name, plus generic DOM-query markers. External script bodies cannot
//! be fetched (CORS), so their URLs are matched instead.

use domgrab_core::identity::ElementIdentity;
use serde::{Deserialize, Serialize};

pub const TRUNCATION_MARKER: &str = "... [truncated]";
const DEFAULT_SCRIPT_TYPE: &str = "text/javascript";
const FRAMEWORK_MARKERS: [&str; 4] = ["jquery", "react", "angular", "vue"];

/// Raw script element as collected from the page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScriptTag {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(rename = "type", default)]
    pub script_type: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "async", default)]
    pub is_async: bool,
    #[serde(default)]
    pub defer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalScript {
    pub index: usize,
    pub src: String,
    #[serde(rename = "type")]
    pub script_type: String,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub defer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineScript {
    pub index: usize,
    #[serde(rename = "type")]
    pub script_type: String,
    pub content: String,
    pub truncated: bool,
    pub original_length: usize,
}

/// A script judged relevant to the clicked element, with the reasons why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevantScript {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(rename = "type")]
    pub script_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub relevance_reason: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSurvey {
    pub external_scripts: Vec<ExternalScript>,
    pub inline_scripts: Vec<InlineScript>,
    pub relevant_scripts: Vec<RelevantScript>,
}

fn truncate(content: &str, max_len: usize) -> (String, bool) {
    if content.len() > max_len {
        let mut cut = max_len;
        while !content.is_char_boundary(cut) {
            cut -= 1;
        }
        (format!("{}{}", &content[..cut], TRUNCATION_MARKER), true)
    } else {
        (content.to_string(), false)
    }
}

fn inline_relevance(text: &str, identity: &ElementIdentity) -> Vec<String> {
    let mut reasons = Vec::new();
    let id = identity.id.trim();
    if !id.is_empty() && text.contains(id) {
        reasons.push(format!("Includes element ID: {}", id));
    }

    let matching: Vec<String> = identity
        .classes
        .names()
        .into_iter()
        .filter(|c| text.contains(c.as_str()))
        .collect();
    if !matching.is_empty() {
        reasons.push(format!("Includes class name(s): {}", matching.join(", ")));
    }

    let tag = identity.tag();
    if !tag.is_empty()
        && (text.contains(&format!("\"{}\"", tag))
            || text.contains(&format!("'{}'", tag))
            || text.contains(&format!("<{}", tag)))
    {
        reasons.push(format!("References tag name: {}", tag));
    }

    if text.contains("querySelector") || text.contains("getElementById") {
        reasons.push("Contains DOM selection methods".to_string());
    }
    reasons
}

fn external_relevance(src: &str, identity: &ElementIdentity) -> Vec<String> {
    let url = src.to_lowercase();
    let mut markers = Vec::new();
    let id = identity.id.trim();
    if !id.is_empty() {
        markers.push(id.to_lowercase());
    }
    for class in identity.classes.names() {
        markers.push(class.to_lowercase());
    }
    let tag = identity.tag();
    if !tag.is_empty() {
        markers.push(tag);
    }

    let matching: Vec<String> = markers.into_iter().filter(|m| url.contains(m)).collect();
    if !matching.is_empty() {
        return vec![format!("URL matches identifier(s): {}", matching.join(", "))];
    }
    if FRAMEWORK_MARKERS.iter().any(|m| url.contains(m)) {
        return vec!["Common JavaScript framework or library".to_string()];
    }
    Vec::new()
}

/// Classify every script on the page and compute relevance against the
/// clicked element. Inline content is truncated to `max_inline_len` with a
/// marker; the untruncated text still feeds the relevance tests.
pub fn survey(
    scripts: &[ScriptTag],
    identity: &ElementIdentity,
    max_inline_len: usize,
) -> ScriptSurvey {
    let mut result = ScriptSurvey::default();

    for (index, script) in scripts.iter().enumerate() {
        let script_type = script
            .script_type
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_SCRIPT_TYPE.to_string());

        if let Some(src) = script.src.as_deref().filter(|s| !s.is_empty()) {
            let info = ExternalScript {
                index,
                src: src.to_string(),
                script_type: script_type.clone(),
                is_async: script.is_async,
                defer: script.defer,
            };
            let reasons = external_relevance(src, identity);
            if !reasons.is_empty() {
                result.relevant_scripts.push(RelevantScript {
                    index,
                    src: Some(info.src.clone()),
                    script_type: script_type.clone(),
                    content: None,
                    relevance_reason: reasons,
                });
            }
            result.external_scripts.push(info);
        } else if !script.text.trim().is_empty() {
            let trimmed = script.text.trim();
            let (content, truncated) = truncate(trimmed, max_inline_len);
            let info = InlineScript {
                index,
                script_type: script_type.clone(),
                content,
                truncated,
                original_length: script.text.len(),
            };
            let reasons = inline_relevance(&script.text, identity);
            if !reasons.is_empty() {
                result.relevant_scripts.push(RelevantScript {
                    index,
                    src: None,
                    script_type,
                    content: Some(info.content.clone()),
                    relevance_reason: reasons,
                });
            }
            result.inline_scripts.push(info);
        }
    }

    result
}
