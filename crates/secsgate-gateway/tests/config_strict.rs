#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use secsgate_gateway::config::{self, ReplyMode};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
connections:
  - name: "host"
    capabilites: { u2: false } # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn unknown_capability_flag_fails() {
    let bad = r#"
version: 1
connections:
  - name: "host"
    capabilities: { u8: true }
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
connections:
  - name: "host"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8080");
    assert_eq!(cfg.gateway.templates_dir, "templates");
    assert_eq!(cfg.gateway.default_timeout_ms, 10_000);

    let c = cfg.connection("host").unwrap();
    assert_eq!(c.reply, ReplyMode::Echo);
    assert_eq!(c.reply_delay_ms, 5);
    assert!(c.capabilities.bool_array);
}

#[test]
fn partial_capabilities_default_to_supported() {
    let ok = r#"
version: 1
connections:
  - name: "legacy"
    reply: silent
    capabilities:
      bool_array: false
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    let c = cfg.connection("legacy").unwrap();
    assert_eq!(c.reply, ReplyMode::Silent);
    assert!(!c.capabilities.bool_array);
    assert!(c.capabilities.i2);
}

#[test]
fn semantic_validation() {
    let cases = [
        // wrong version
        "version: 2\nconnections:\n  - name: a\n",
        // no connections
        "version: 1\n",
        // duplicate names
        "version: 1\nconnections:\n  - name: a\n  - name: a\n",
        // empty name
        "version: 1\nconnections:\n  - name: \"  \"\n",
        // timeout out of range
        "version: 1\ngateway:\n  default_timeout_ms: 0\nconnections:\n  - name: a\n",
        // bad listen address
        "version: 1\ngateway:\n  listen: \"nowhere\"\nconnections:\n  - name: a\n",
        // reply delay too long
        "version: 1\nconnections:\n  - name: a\n    reply_delay_ms: 70000\n",
        // unknown reply mode
        "version: 1\nconnections:\n  - name: a\n    reply: shout\n",
    ];
    for c in cases {
        let err = config::load_from_str(c).expect_err(c);
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST", "case={c}");
    }
}

#[test]
fn sample_config_loads() {
    let cfg = config::load_from_file("../../secsgate.yaml").expect("sample config must load");
    assert!(cfg.connections.len() >= 2);
}
