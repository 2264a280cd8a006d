// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;

#[test]
fn server_event_from_json_full_envelope() {
    let event = ServerEvent::from_json(
        r#"{"type":"ticket_assigned","data":{"ticket_id":42},"timestamp":"2026-01-15T10:30:00Z"}"#,
    )
    .unwrap();

    assert_eq!(event.event_type, "ticket_assigned");
    assert_eq!(event.data["ticket_id"], 42);
    assert!(event.timestamp.is_some());
}

#[test]
fn server_event_from_json_without_optional_fields() {
    let event = ServerEvent::from_json(r#"{"type":"refresh"}"#).unwrap();

    assert_eq!(event.event_type, "refresh");
    assert_eq!(event.data, serde_json::Value::Null);
    assert!(event.timestamp.is_none());
}

#[test]
fn server_event_from_json_rejects_missing_type() {
    assert!(ServerEvent::from_json(r#"{"data":{}}"#).is_err());
    assert!(ServerEvent::from_json("not json").is_err());
    assert!(ServerEvent::from_json("[1,2,3]").is_err());
}

#[test]
fn server_event_heartbeat_ack_detection() {
    let ack = ServerEvent::new(HEARTBEAT_ACK, serde_json::Value::Null);
    assert!(ack.is_heartbeat_ack());

    let event = ServerEvent::new("notification", json!({"id": 1}));
    assert!(!event.is_heartbeat_ack());
}

#[test]
fn client_message_ping_wire_format() {
    let json = ClientMessage::ping().to_json().unwrap();
    assert_eq!(json, r#"{"type":"ping"}"#);
}

#[test]
fn client_message_data_passthrough() {
    let msg = ClientMessage::data(json!({"type": "mark_read", "id": 7}));
    let json = msg.to_json().unwrap();
    let round: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(round["type"], "mark_read");
    assert_eq!(round["id"], 7);
}

#[test]
fn server_event_round_trip() {
    let event = ServerEvent::new("message_received", json!({"from": "instructor-3"}));
    let json = event.to_json().unwrap();
    let back = ServerEvent::from_json(&json).unwrap();
    assert_eq!(back, event);
}
