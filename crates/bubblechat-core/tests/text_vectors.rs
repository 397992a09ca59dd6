//! Envelope vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bubblechat_core::protocol::records::{decode, PresenceEntry};
use bubblechat_core::protocol::text::Envelope;
use bubblechat_core::ColorIdentity;

mod vector_loader;
use vector_loader::load_str;

#[test]
fn parse_envelope_min() {
    let env: Envelope = serde_json::from_str(&load_str("envelope_min.json")).unwrap();
    assert_eq!(env.v, 1);
    assert_eq!(env.svc, "store");
    assert_eq!(env.msg_type, "read");
    assert_eq!(env.path.as_deref(), Some("rooms/HAICCHAT"));
    assert!(env.seq.is_none());
    assert!(env.data.is_none());
}

#[test]
fn parse_envelope_full() {
    let env: Envelope = serde_json::from_str(&load_str("envelope_full.json")).unwrap();
    assert_eq!(env.msg_type, "write");
    assert_eq!(env.seq, Some(123));
    let raw = env.data.unwrap();
    let value: serde_json::Value = serde_json::from_str(raw.get()).unwrap();
    let entry: PresenceEntry = decode(value).unwrap();
    assert_eq!(entry.color, ColorIdentity::Pink);
    assert_eq!(entry.user, "user1");
}

#[test]
fn unknown_envelope_field_rejected() {
    let bad = r#"{ "v": 1, "svc": "store", "type": "read", "room": "X" }"#;
    assert!(serde_json::from_str::<Envelope>(bad).is_err());
}
