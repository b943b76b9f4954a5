use domgrab_engine::evaluator::InspectedWindow;
use domgrab_engine::orchestrator::PageProbe;
use domgrab_h::cdp::CdpClient;
use domgrab_h::page::CdpPageProbe;
use domgrab_h::window::CdpWindow;
use serial_test::serial;

const TEST_PAGE: &str = "<html><head><title>Capture Test</title></head>\
    <body>\
    <button id='go' class='primary big' onclick='launch()'>Go</button>\
    <span class='Header_nav__xy12'>nav</span>\
    <script>function launch() { console.log('launch'); }</script>\
    </body></html>";

#[tokio::test]
#[serial]
async fn capture_primitives_against_a_live_page() {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .ok();

    let client = match CdpClient::launch(false).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to launch browser (is Chromium installed?): {}", e);
            return;
        }
    };

    let url = format!("data:text/html,{}", TEST_PAGE);
    client.goto(&url).await.expect("Navigation failed");

    let window = CdpWindow::new(client.page.clone());

    // Direct id resolution.
    let facts = window
        .eval_element("document.getElementById('go')")
        .await
        .expect("evaluation failed")
        .expect("element should resolve");
    assert_eq!(facts.tag_name, "BUTTON");
    assert_eq!(facts.id, "go");
    assert_eq!(facts.classes, "primary big");
    assert!(facts.inline_events.contains_key("click"));

    // Null resolution stays a value, not an error.
    let missing = window
        .eval_element("document.getElementById('nope')")
        .await
        .expect("evaluation failed");
    assert!(missing.is_none());

    // Tag scan in document order.
    let spans = window
        .elements_by_tag("span")
        .await
        .expect("tag scan failed");
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].classes, "Header_nav__xy12");

    // Page-local snapshot and script survey.
    let probe = CdpPageProbe::new(client.page.clone(), "#go");
    let snapshot = probe.snapshot().await.expect("snapshot failed");
    assert_eq!(snapshot.identity.id, "go");
    assert!(snapshot.outer_html.contains("id=\"go\""));
    assert!(!snapshot.computed_style.is_empty());
    assert_eq!(snapshot.inline_handlers.len(), 1);

    let scripts = probe.scripts().await.expect("script listing failed");
    assert!(scripts.iter().any(|s| s.text.contains("launch")));

    client.close().await.expect("close failed");
}
