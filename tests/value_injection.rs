use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, json};
use std::io::Write;
use wirebean::prelude::*;

const APPLICATION_YAML: &str = r#"
rady:
  redis:
    host: 127.0.0.1
    port: 6937
  mysql:
    host: localhost
    utf-8: true
  jwt:
    start: "2018-01-30 00:00:00"
  server:
    ports: [80, 443]
    ready: [true, false]
    starts: ["2018-01-30 00:00:00", "2018-01-31T08:00:00Z"]
"#;

#[derive(Default, Bean)]
struct ValueInjectTest {
    marker: Testing,
    #[bean(value = "rady.redis.port")]
    redis_port_int: i64,
    #[bean(value = "rady.redis.port")]
    redis_port_uint: u64,
    #[bean(value = "rady.redis.port")]
    redis_port_float: f64,
    #[bean(value = "rady.redis.port")]
    redis_port_str: String,
    #[bean(value = "rady.redis.port")]
    redis_port_live: Value<i64>,
    #[bean(value = "rady.mysql.utf-8")]
    mysql_utf8: bool,
    #[bean(value = "rady.jwt.start")]
    jwt_start: NaiveDateTime,
    #[bean(value = "rady")]
    rady: Map<String, serde_json::Value>,
    #[bean(value = "rady.server.ports")]
    ports_raw: Vec<serde_json::Value>,
    #[bean(value = "rady.server.ports")]
    ports_int: Vec<i64>,
    #[bean(value = "rady.server.ports")]
    ports_uint: Value<Vec<u64>>,
    #[bean(value = "rady.server.ports")]
    ports_str: Vec<String>,
    #[bean(value = "rady.server.ready")]
    ready: Vec<bool>,
    #[bean(value = "rady.server.starts")]
    starts: Vec<NaiveDateTime>,
    #[bean(value = "rady.missing", default = "fallback")]
    missing: String,
    #[bean(value = "rady.redis.host", default = "ignored")]
    host: String,
    not_injected: i32,
}

#[derive(Default, Bean)]
struct ValueInjectRoot {
    marker: Configuration,
}

fn jan_30() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2018, 1, 30)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn application() -> Application {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(APPLICATION_YAML.as_bytes()).unwrap();

    let app = Application::builder()
        .config_file(file.path())
        .root::<ValueInjectRoot>()
        .with_test::<ValueInjectTest>()
        .build()
        .unwrap();
    drop(file);
    app
}

#[test]
fn test_scalar_injection() {
    let app = application();
    app.test::<ValueInjectTest, _>(|v| {
        assert_eq!(v.redis_port_int, 6937);
        assert_eq!(v.redis_port_uint, 6937);
        assert_eq!(v.redis_port_float, 6937.0);
        assert_eq!(v.redis_port_str, "6937");
        assert_eq!(v.redis_port_live.get(), 6937);
        assert!(v.mysql_utf8);
        assert_eq!(v.jwt_start, jan_30());
        assert_eq!(v.missing, "fallback");
        assert_eq!(v.host, "127.0.0.1");
        assert_eq!(v.not_injected, 0);
    })
    .unwrap();
}

#[test]
fn test_map_injection() {
    let app = application();
    app.test::<ValueInjectTest, _>(|v| {
        assert_eq!(v.rady["mysql"]["host"], json!("localhost"));
        assert_eq!(v.rady["mysql"]["utf-8"], json!(true));
        assert_eq!(v.rady["redis"]["port"], json!(6937));
    })
    .unwrap();
}

#[test]
fn test_array_injection() {
    let app = application();
    app.test::<ValueInjectTest, _>(|v| {
        assert_eq!(v.ports_raw, vec![json!(80), json!(443)]);
        assert_eq!(v.ports_int, vec![80, 443]);
        assert_eq!(v.ports_uint.get(), vec![80, 443]);
        assert_eq!(v.ports_str, vec!["80".to_string(), "443".to_string()]);
        assert_eq!(v.ready, vec![true, false]);
        assert_eq!(v.starts[0], jan_30());
        assert_eq!(
            v.starts[1],
            NaiveDate::from_ymd_opt(2018, 1, 31)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap()
        );
    })
    .unwrap();
}

#[derive(Default, Bean)]
struct Port {
    marker: Component,
    #[bean(value = "app.port", default = "9090")]
    port: i64,
    #[bean(value = "app.missing", default = "9090")]
    missing: i64,
    #[bean(value = "server.ports")]
    ports: Vec<i64>,
    #[bean(value = "server.ports")]
    narrow_ports: Vec<u16>,
}

#[test]
fn test_port_defaults() {
    let app = Application::builder()
        .config_value(json!({"app": {"port": 8080}, "server": {"ports": [80, 443]}}))
        .root::<Port>()
        .build()
        .unwrap();

    let port = app.bean::<Port>().unwrap();
    let port = port.read().unwrap();
    assert_eq!(port.port, 8080);
    assert_eq!(port.missing, 9090);
    assert_eq!(port.ports, vec![80, 443]);
    assert_eq!(port.narrow_ports, vec![80u16, 443]);
}

#[test]
fn test_fields_on_one_key_share_a_cell() {
    let app = Application::builder()
        .config_value(json!({"app": {"port": 8080}}))
        .root::<Port>()
        .build()
        .unwrap();

    let values = app.container().values();
    assert_eq!(values.len(), 3);
    let bean = values.get("app.port", Some("9090")).unwrap();
    assert_eq!(bean.raw(), json!(8080));
    assert_eq!(bean.form_count(), 1);
}
