//! Assembly of the final text bundle.
//!
//! The bundle is a single blob with comment-fenced sections (`index.html`,
//! `styles.css`, `listeners.json`, script data) intended for direct human or
//! AI consumption, not a machine-parseable format.

use crate::scripts::ScriptSurvey;
use crate::snapshot::ElementSnapshot;
use domgrab_core::listener::ListenerOutcome;
use domgrab_core::selector::css_display;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

pub struct BundleContext<'a> {
    pub snapshot: &'a ElementSnapshot,
    pub survey: &'a ScriptSurvey,
    pub listeners: &'a ListenerOutcome,
    pub devtools_connected: bool,
    pub timestamp: u64,
}

fn json_block<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{ \"error\": \"serialization failed: {}\" }}", e))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JavascriptData<'a> {
    inline_handlers: BTreeMap<&'a str, &'a str>,
    relevant_scripts: &'a [crate::scripts::RelevantScript],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AllScripts<'a> {
    external_scripts: &'a [crate::scripts::ExternalScript],
    inline_scripts: &'a [crate::scripts::InlineScript],
}

pub fn render(ctx: &BundleContext) -> String {
    let element = css_display(&ctx.snapshot.identity);
    let mut out = String::new();

    let _ = writeln!(out, "/* --- domgrab element data --- */");
    let _ = writeln!(out, "/* Element: {} */", element);
    let _ = writeln!(out, "/* Captured at: {} */", ctx.timestamp);
    if ctx.devtools_connected {
        let _ = writeln!(out, "/* DevTools Connected */");
    } else {
        let _ = writeln!(out, "/* DevTools Not Connected */");
    }

    let _ = writeln!(out, "\n/* --- index.html --- */");
    let _ = writeln!(out, "/*\n{}\n*/", ctx.snapshot.outer_html);

    let _ = writeln!(out, "\n/* --- styles.css --- */");
    let _ = writeln!(out, "/* Computed styles for element: {} */\n", element);
    let _ = writeln!(out, "{} {{", element);
    if ctx.snapshot.computed_style.is_empty() {
        let _ = writeln!(out, "  /* No computed styles available */");
    } else {
        for prop in &ctx.snapshot.computed_style {
            let _ = writeln!(out, "  {}: {};", prop.name, prop.value);
        }
    }
    let _ = writeln!(out, "}}");

    let _ = writeln!(out, "\n/* --- listeners.json --- */");
    let _ = writeln!(out, "/*\n{}\n*/", json_block(ctx.listeners));

    let inline_handlers: BTreeMap<&str, &str> = ctx
        .snapshot
        .inline_handlers
        .iter()
        .map(|(event, body)| (event.as_str(), body.as_str()))
        .collect();
    let _ = writeln!(out, "\n/* --- javascript-data.json --- */");
    let _ = writeln!(
        out,
        "/*\n{}\n*/",
        json_block(&JavascriptData {
            inline_handlers,
            relevant_scripts: &ctx.survey.relevant_scripts,
        })
    );

    let _ = writeln!(out, "\n/* --- all-scripts.json --- */");
    let _ = writeln!(
        out,
        "/*\n{}\n*/",
        json_block(&AllScripts {
            external_scripts: &ctx.survey.external_scripts,
            inline_scripts: &ctx.survey.inline_scripts,
        })
    );

    let _ = writeln!(out, "\n/* --- Additional Info --- */");
    if let ListenerOutcome::Failure(record) = ctx.listeners {
        let _ = writeln!(
            out,
            "/* Note: Could not fully retrieve event listeners ({}).\n   \
             This is often due to DevTools security restrictions.\n   \
             The element's HTML and CSS have been successfully captured. */",
            record.error
        );
    }
    if ctx.survey.relevant_scripts.is_empty() {
        let _ = writeln!(
            out,
            "/* Note: No relevant JavaScript files detected for this element. */"
        );
    } else {
        let _ = writeln!(
            out,
            "/* Note: Found {} JavaScript files/snippets that may be relevant to this element.\n   \
             These are included in the javascript-data.json section. */",
            ctx.survey.relevant_scripts.len()
        );
    }

    out
}
