#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bubblechat_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
chat:
  pop_delay: 300 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8080");
    assert_eq!(cfg.chat.min_room_code_len, 3);
    assert_eq!(cfg.chat.pop_delay_ms, 300);
    assert!(cfg.chat.preset_rooms.is_empty());
}

#[test]
fn unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn out_of_range_values_rejected() {
    let cases = [
        "version: 1\ngateway:\n  ping_interval_ms: 100\n",
        "version: 1\ngateway:\n  ping_interval_ms: 60000\n  idle_timeout_ms: 30000\n",
        "version: 1\nchat:\n  pop_delay_ms: 60000\n",
        "version: 1\nchat:\n  bubble_x_min: 90\n  bubble_x_max: 10\n",
        "version: 1\nchat:\n  preset_rooms: [\"ab\"]\n",
        "version: 1\nchat:\n  preset_rooms: [\"a/b/c\"]\n",
    ];
    for case in cases {
        let err = config::load_from_str(case).expect_err(case);
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST", "case={case}");
    }
}

#[test]
fn preset_rooms_parse() {
    let ok = r#"
version: 1
chat:
  preset_rooms:
    - haicchat
    - "천문학적으로 사랑해"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.chat.preset_rooms.len(), 2);
}
