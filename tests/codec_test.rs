//! Wire format tests for the work item codec.

use serde_json::{Value, json};
use workpipe::codec::{decode, decode_bytes, encode};
use workpipe::error::Error;
use workpipe::model::{ActorId, WorkItem};

fn item(producer: &str, payload: &str, ts: f64) -> WorkItem {
    WorkItem::new(ActorId::from(producer), payload, ts).unwrap()
}

fn assert_decode_error(text: &str) {
    match decode(text) {
        Err(Error::Decode { .. }) => {}
        other => panic!("expected Decode error for {text:?}, got {other:?}"),
    }
}

#[test]
fn encode_then_decode_gives_back_the_item() {
    for w in [
        item("Master-1", "file-42.txt", 1000.0),
        item("Master-9f3a01bc", "file-0.txt", 1_731_000_000.123_456),
        item("Master-x", "résumé.txt", 0.5),
        WorkItem::generate(&ActorId::generate("Master")).unwrap(),
    ] {
        let text = encode(&w).unwrap();
        assert_eq!(decode(&text).unwrap(), w);
    }
}

#[test]
fn uses_master_filename_timestamp_keys() {
    let text = encode(&item("Master-1", "file-42.txt", 1000.25)).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        value,
        json!({"master_id": "Master-1", "filename": "file-42.txt", "timestamp": 1000.25})
    );
}

#[test]
fn decodes_externally_produced_payload() {
    let w = decode(r#"{"master_id": "Master-4821", "filename": "file-77.txt", "timestamp": 1700000000.5}"#)
        .unwrap();
    assert_eq!(w.producer_id().as_str(), "Master-4821");
    assert_eq!(w.payload_name(), "file-77.txt");
    assert_eq!(w.created_at(), 1_700_000_000.5);
}

#[test]
fn integer_timestamp_and_extra_keys_are_accepted() {
    let w = decode(r#"{"master_id":"Master-1","filename":"a.txt","timestamp":12,"extra":true}"#)
        .unwrap();
    assert_eq!(w.created_at(), 12.0);
}

#[test]
fn malformed_text_is_a_decode_error() {
    assert_decode_error("");
    assert_decode_error("not json at all");
    assert_decode_error("{\"master_id\": \"Master-1\"");
    assert_decode_error("[1, 2, 3]");
}

#[test]
fn missing_or_mistyped_fields_are_decode_errors() {
    assert_decode_error(r#"{"filename":"a.txt","timestamp":1.0}"#);
    assert_decode_error(r#"{"master_id":"Master-1","timestamp":1.0}"#);
    assert_decode_error(r#"{"master_id":"Master-1","filename":"a.txt"}"#);
    assert_decode_error(r#"{"master_id":"Master-1","filename":"a.txt","timestamp":"now"}"#);
    assert_decode_error(r#"{"master_id":7,"filename":"a.txt","timestamp":1.0}"#);
}

#[test]
fn invariant_violations_are_decode_errors() {
    assert_decode_error(r#"{"master_id":"Master-1","filename":"","timestamp":1.0}"#);
    assert_decode_error(r#"{"master_id":"","filename":"a.txt","timestamp":1.0}"#);
    assert_decode_error(r#"{"master_id":"Master-1","filename":"../escape.txt","timestamp":1.0}"#);
    assert_decode_error(r#"{"master_id":"..","filename":"a.txt","timestamp":1.0}"#);
}

#[test]
fn non_utf8_bytes_are_a_decode_error() {
    for raw in [&b"\xff\xfe"[..], b"{\"master_id\":\"Master-\xc3\x28\",\"filename\":\"a.txt\",\"timestamp\":1}"] {
        match decode_bytes(raw) {
            Err(Error::Decode { .. }) => {}
            other => panic!("expected Decode error for {raw:?}, got {other:?}"),
        }
    }
}
