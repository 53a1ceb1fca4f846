use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use wirebean::lifecycle::spawn_reload_task;
use wirebean::ConfigError;
use wirebean::prelude::*;

#[derive(Default, Bean)]
struct ServerConfig {
    marker: Configuration,
    #[bean(value = "server.name", default = "demo")]
    name: Value<String>,
    #[bean(value = "server.ports")]
    ports: Vec<i64>,
}

fn yaml_file(text: &str) -> NamedTempFile {
    let file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    std::fs::write(file.path(), text).unwrap();
    file
}

#[test]
fn test_reload_from_file() {
    wirebean::logging::init_test_logging(None);
    let file = yaml_file("server:\n  ports: [80, 443]\n");
    let app = Application::builder()
        .config_file(file.path())
        .root::<ServerConfig>()
        .build()
        .unwrap();

    let config = app.bean::<ServerConfig>().unwrap();
    assert_eq!(config.read().unwrap().ports, vec![80, 443]);
    assert_eq!(config.read().unwrap().name.get(), "demo");

    std::fs::write(file.path(), "server:\n  name: edge\n  ports: [8443]\n").unwrap();
    let summary = app.reload().unwrap();
    assert_eq!(
        summary.changed,
        vec!["server.name".to_string(), "server.ports".to_string()]
    );
    assert!(summary.recalled.is_empty());
    assert_eq!(config.read().unwrap().ports, vec![8443]);
    assert_eq!(config.read().unwrap().name.get(), "edge");
}

#[test]
fn test_broken_file_keeps_values() {
    let file = yaml_file("server:\n  name: edge\n");
    let app = Application::builder()
        .config_file(file.path())
        .root::<ServerConfig>()
        .build()
        .unwrap();

    std::fs::write(file.path(), "server: [unclosed\n").unwrap();
    let err = app.reload().unwrap_err();
    assert!(matches!(err, WireError::Config(_)));
    assert!(!err.is_wiring_error());

    let config = app.bean::<ServerConfig>().unwrap();
    assert_eq!(config.read().unwrap().name.get(), "edge");
    assert_eq!(app.container().config().get_as::<String>("server.name", None), "edge");
}

#[test]
fn test_missing_file_fails_build() {
    let result = Application::builder()
        .config_file("/no/such/config.yaml")
        .root::<ServerConfig>()
        .build();
    assert!(matches!(result, Err(WireError::Config(ConfigError::Io { .. }))));
}

#[tokio::test]
async fn test_periodic_reload_picks_up_changes() {
    let file = yaml_file("server:\n  name: before\n");
    let app = Arc::new(
        Application::builder()
            .config_file(file.path())
            .root::<ServerConfig>()
            .build()
            .unwrap(),
    );
    let config = app.bean::<ServerConfig>().unwrap();
    let name = config.read().unwrap().name.clone();

    let handle = spawn_reload_task(Arc::clone(&app), Duration::from_millis(20));
    std::fs::write(file.path(), "server:\n  name: after\n").unwrap();

    let mut seen = name.get();
    for _ in 0..100 {
        if seen == "after" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        seen = name.get();
    }
    handle.abort();
    assert_eq!(seen, "after");
}
