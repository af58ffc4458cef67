#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use vitals_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
health:
  service:
    succes_probability: 0.5 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.listen, "0.0.0.0:8080");
    assert_eq!(cfg.metrics.application, "actuator-monitoring");
    assert_eq!(cfg.metrics.max_operation_types, 1000);
    assert_eq!(cfg.health.probe_timeout_ms, 2000);
    assert_eq!(cfg.health.service.success_probability, 0.8);
    assert_eq!(cfg.health.storage.url, "jdbc:h2:mem:testdb");
    assert!(cfg.health.storage.address.is_none());
    assert_eq!(cfg.api.operation_delay_min_ms, 50);
    assert_eq!(cfg.api.operation_delay_max_ms, 250);
}

#[test]
fn full_config_overrides_defaults() {
    let ok = r#"
version: 1
server:
  listen: "127.0.0.1:9000"
metrics:
  application: "billing"
  max_operation_types: 0
health:
  probe_timeout_ms: 500
  service:
    name: "Payments API"
    success_probability: 1.0
  storage:
    name: "Postgres"
    url: "postgres://db/billing"
    address: "db:5432"
api:
  operation_delay_min_ms: 0
  operation_delay_max_ms: 0
  operation_failure_rate: 0.5
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.metrics.application, "billing");
    assert_eq!(cfg.metrics.max_operation_types, 0);
    assert_eq!(cfg.health.service.name, "Payments API");
    assert_eq!(cfg.health.storage.address.as_deref(), Some("db:5432"));
    assert_eq!(cfg.api.operation_failure_rate, 0.5);
}

#[test]
fn unsupported_version_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn out_of_range_values_rejected() {
    let cases = [
        "version: 1\nhealth:\n  service:\n    success_probability: 1.5\n",
        "version: 1\nhealth:\n  probe_timeout_ms: 0\n",
        "version: 1\nhealth:\n  storage:\n    address: \"nohostport\"\n",
        "version: 1\nhealth:\n  storage:\n    address: \":\"\n",
        "version: 1\nhealth:\n  storage:\n    address: \":5432\"\n",
        "version: 1\nhealth:\n  storage:\n    address: \"a:b:c\"\n",
        "version: 1\nhealth:\n  storage:\n    address: \"db:0\"\n",
        "version: 1\nhealth:\n  storage:\n    address: \"db:70000\"\n",
        "version: 1\nmetrics:\n  application: \"  \"\n",
        "version: 1\napi:\n  operation_delay_min_ms: 300\n  operation_delay_max_ms: 100\n",
        "version: 1\napi:\n  operation_failure_rate: -0.1\n",
    ];
    for case in cases {
        let err = config::load_from_str(case).expect_err(case);
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST", "{case}");
    }
}

#[test]
fn storage_address_accepts_host_port_forms() {
    for addr in ["db:5432", "10.0.0.7:5432", "[::1]:5432"] {
        let yaml = format!("version: 1\nhealth:\n  storage:\n    address: \"{addr}\"\n");
        let cfg = config::load_from_str(&yaml).expect(addr);
        assert_eq!(cfg.health.storage.address.as_deref(), Some(addr));
    }
}

#[test]
fn storage_check_expires_before_probe_timeout() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.health.storage_connect_timeout(), Duration::from_millis(1800));
    assert!(cfg.health.storage_connect_timeout() < cfg.health.probe_timeout());

    let cfg = config::load_from_str("version: 1\nhealth:\n  probe_timeout_ms: 10\n")
        .expect("must parse");
    assert_eq!(cfg.health.storage_connect_timeout(), Duration::from_millis(9));
}

#[test]
fn missing_file_is_reported() {
    let err = config::load_from_file("does/not/exist.yaml").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "INTERNAL");
}
