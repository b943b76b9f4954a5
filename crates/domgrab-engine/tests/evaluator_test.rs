use async_trait::async_trait;
use domgrab_core::error::CaptureError;
use domgrab_core::listener::{CapabilityProbe, ElementFacts};
use domgrab_engine::evaluator::{ElementEvaluator, EvalError, InspectedWindow};
use std::collections::HashMap;
use std::sync::Mutex;

/// Window whose direct evaluations and tag scans are scripted per test.
#[derive(Default)]
struct MockWindow {
    direct: HashMap<String, Option<ElementFacts>>,
    by_tag: HashMap<String, Vec<ElementFacts>>,
    throw_on: Vec<String>,
    channel_down: bool,
    eval_log: Mutex<Vec<String>>,
}

fn facts(tag: &str, id: &str, classes: &str) -> ElementFacts {
    ElementFacts {
        tag_name: tag.to_string(),
        id: id.to_string(),
        classes: classes.to_string(),
        ..ElementFacts::default()
    }
}

#[async_trait]
impl InspectedWindow for MockWindow {
    async fn eval_element(&self, expr: &str) -> Result<Option<ElementFacts>, EvalError> {
        self.eval_log.lock().unwrap().push(expr.to_string());
        if self.channel_down {
            return Err(EvalError::Channel("context destroyed".to_string()));
        }
        if self.throw_on.iter().any(|e| e == expr) {
            return Err(EvalError::Threw("SyntaxError".to_string()));
        }
        Ok(self.direct.get(expr).cloned().flatten())
    }

    async fn elements_by_tag(&self, tag: &str) -> Result<Vec<ElementFacts>, EvalError> {
        Ok(self.by_tag.get(tag).cloned().unwrap_or_default())
    }

    async fn event_listeners(&self, _expr: &str) -> Result<CapabilityProbe, EvalError> {
        Ok(CapabilityProbe::Unavailable)
    }
}

#[tokio::test]
async fn direct_resolution_wins() {
    let expr = "document.getElementById('submit-btn')";
    let mut window = MockWindow::default();
    window
        .direct
        .insert(expr.to_string(), Some(facts("BUTTON", "submit-btn", "")));

    let evaluator = ElementEvaluator::new(&window, true);
    let resolved = evaluator.resolve(expr).await.unwrap();
    assert_eq!(resolved.id, "submit-btn");
}

#[tokio::test]
async fn null_resolution_falls_back_to_class_substring() {
    // The page renders "Header_nav__abc999" but the capture recorded
    // "Header_nav__xy12"; the substring tier still cannot match the full
    // hashed name, the prefix tier does.
    let expr = "document.querySelector('span.Header_nav__xy12')";
    let mut window = MockWindow::default();
    window.by_tag.insert(
        "span".to_string(),
        vec![
            facts("SPAN", "", "other"),
            facts("SPAN", "", "Header_nav__abc999"),
        ],
    );

    let evaluator = ElementEvaluator::new(&window, true);
    let resolved = evaluator.resolve(expr).await.unwrap();
    assert_eq!(resolved.classes, "Header_nav__abc999");
}

#[tokio::test]
async fn exact_class_substring_is_preferred_over_prefix() {
    let expr = "document.querySelector('div.card')";
    let mut window = MockWindow::default();
    window.by_tag.insert(
        "div".to_string(),
        vec![facts("DIV", "", "cardholder"), facts("DIV", "", "plain")],
    );

    let evaluator = ElementEvaluator::new(&window, true);
    // "cardholder" contains "card", so the substring tier matches it.
    let resolved = evaluator.resolve(expr).await.unwrap();
    assert_eq!(resolved.classes, "cardholder");
}

#[tokio::test]
async fn thrown_expression_still_reaches_permissive_tier() {
    let expr = "document.querySelector('nav.menu')";
    let mut window = MockWindow::default();
    window.throw_on.push(expr.to_string());
    window
        .by_tag
        .insert("nav".to_string(), vec![facts("NAV", "", "menu")]);

    let evaluator = ElementEvaluator::new(&window, true);
    let resolved = evaluator.resolve(expr).await.unwrap();
    assert_eq!(resolved.classes, "menu");
}

#[tokio::test]
async fn first_of_tag_is_the_last_resort() {
    let expr = "document.querySelector('p.nomatch')";
    let mut window = MockWindow::default();
    window.by_tag.insert(
        "p".to_string(),
        vec![facts("P", "first", ""), facts("P", "second", "")],
    );

    let evaluator = ElementEvaluator::new(&window, true);
    let resolved = evaluator.resolve(expr).await.unwrap();
    assert_eq!(resolved.id, "first");
}

#[tokio::test]
async fn no_elements_of_tag_means_not_found() {
    let window = MockWindow::default();
    let evaluator = ElementEvaluator::new(&window, true);
    let err = evaluator
        .resolve("document.querySelector('table.data')")
        .await
        .unwrap_err();
    assert!(matches!(err, CaptureError::ElementNotFound { .. }));
}

#[tokio::test]
async fn permissive_tier_is_skipped_when_disabled() {
    let expr = "document.querySelector('div.card')";
    let mut window = MockWindow::default();
    window
        .by_tag
        .insert("div".to_string(), vec![facts("DIV", "", "card")]);

    let evaluator = ElementEvaluator::new(&window, false);
    let err = evaluator.resolve(expr).await.unwrap_err();
    assert!(matches!(err, CaptureError::ElementNotFound { .. }));
}

#[tokio::test]
async fn channel_failure_is_not_recoverable() {
    let window = MockWindow {
        channel_down: true,
        ..MockWindow::default()
    };
    let evaluator = ElementEvaluator::new(&window, true);
    let err = evaluator
        .resolve("document.getElementById('x')")
        .await
        .unwrap_err();
    assert!(matches!(err, CaptureError::Eval(_)));
    assert!(!err.is_recoverable());
}
