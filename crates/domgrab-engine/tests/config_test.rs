use domgrab_engine::config::{ConfigLoader, DomgrabConfig};
use std::time::Duration;

#[test]
fn defaults_match_the_protocol_constants() {
    let config = DomgrabConfig::default();
    assert!(config.picker.use_simple_selectors);
    assert!(config.picker.try_fallback_selectors);
    assert_eq!(config.timing.probe_timeout(), Duration::from_millis(500));
    assert_eq!(config.timing.settle_delay(), Duration::from_millis(100));
    assert_eq!(config.timing.final_wait(), Duration::from_millis(1500));
    assert_eq!(
        config.timing.connection_check_period(),
        Duration::from_secs(10)
    );
    assert_eq!(config.capture.max_inline_script_len, 500);
}

#[tokio::test]
async fn partial_yaml_overrides_only_named_fields() {
    let path = std::env::temp_dir().join(format!(
        "domgrab-config-test-{}.yaml",
        std::process::id()
    ));
    tokio::fs::write(
        &path,
        "picker:\n  use_simple_selectors: false\ntiming:\n  final_wait_ms: 3000\n",
    )
    .await
    .unwrap();

    let config = ConfigLoader::load_from(&path).await.unwrap();
    tokio::fs::remove_file(&path).await.ok();

    assert!(!config.picker.use_simple_selectors);
    // Unset sibling fields keep their defaults.
    assert!(config.picker.try_fallback_selectors);
    assert_eq!(config.timing.final_wait(), Duration::from_millis(3000));
    assert_eq!(config.timing.probe_timeout(), Duration::from_millis(500));
}

#[tokio::test]
async fn malformed_yaml_is_a_parse_error() {
    let path = std::env::temp_dir().join(format!(
        "domgrab-config-bad-{}.yaml",
        std::process::id()
    ));
    tokio::fs::write(&path, "timing: [not, a, map]\n").await.unwrap();

    let result = ConfigLoader::load_from(&path).await;
    tokio::fs::remove_file(&path).await.ok();
    assert!(result.is_err());
}
