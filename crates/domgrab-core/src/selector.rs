//! Selector plan construction and selector-expression parsing.
//!
//! A plan is derived deterministically from an [`ElementIdentity`] and never
//! mutated afterwards. Candidates are ordered most-specific first and tried
//! strictly in construction order: id lookup, then `tag.firstClass`, then
//! `tag.all.classes`, then first element of the tag.

use crate::error::CaptureError;
use crate::identity::ElementIdentity;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Ordered selector candidates for re-locating an element from another
/// execution context. `fallbacks` always contains `primary` plus any less
/// specific alternates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorPlan {
    pub primary: String,
    pub fallbacks: Vec<String>,
}

impl SelectorPlan {
    /// First fallback that differs from the primary, if any. This is the
    /// single alternate tried during fallback escalation.
    pub fn first_alternate(&self) -> Option<&str> {
        self.fallbacks
            .iter()
            .map(String::as_str)
            .find(|s| *s != self.primary)
    }
}

/// Build the selector plan for an element identity.
///
/// Id lookups are assumed unambiguous, so a non-empty id yields a single
/// candidate. An identity with an empty tag name has nothing to query by and
/// fails with `NoCandidates`.
pub fn build_selectors(identity: &ElementIdentity) -> Result<SelectorPlan, CaptureError> {
    if !identity.id.trim().is_empty() {
        let primary = format!("document.getElementById('{}')", identity.id.trim());
        return Ok(SelectorPlan {
            fallbacks: vec![primary.clone()],
            primary,
        });
    }

    let tag = identity.tag();
    if tag.is_empty() {
        return Err(CaptureError::NoCandidates);
    }

    let classes = identity.classes.names();
    if let Some(first) = classes.first() {
        let primary = format!("document.querySelector('{}.{}')", tag, first);
        let all = format!("document.querySelector('{}.{}')", tag, classes.join("."));
        return Ok(SelectorPlan {
            primary: primary.clone(),
            fallbacks: vec![primary, all],
        });
    }

    let primary = format!("document.getElementsByTagName('{}')[0]", tag);
    Ok(SelectorPlan {
        fallbacks: vec![primary.clone()],
        primary,
    })
}

/// Human-readable `tag#id.class.list` form used in bundle headers.
pub fn css_display(identity: &ElementIdentity) -> String {
    let mut out = identity.tag();
    if !identity.id.trim().is_empty() {
        out.push('#');
        out.push_str(identity.id.trim());
    }
    for class in identity.classes.names() {
        out.push('.');
        out.push_str(&class);
    }
    out
}

fn parts_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\('([A-Za-z][A-Za-z0-9]*)(?:\.([A-Za-z0-9_-]+))?").expect("valid regex")
    })
}

/// Extract the tag name and first class name from a selector expression,
/// e.g. `document.querySelector('span.Header_nav__xy12')` yields
/// `("span", Some("Header_nav__xy12"))`. Used by the permissive resolution
/// tier when the expression itself fails to resolve.
pub fn selector_parts(expr: &str) -> Option<(String, Option<String>)> {
    let caps = parts_regex().captures(expr)?;
    let tag = caps.get(1)?.as_str().to_string();
    let class = caps.get(2).map(|m| m.as_str().to_string());
    Some((tag, class))
}
