//! Flat event lines: `{"entity_key", "event_time", "event_id", "payload"}`.

use super::{parse_timestamp, Event, Outcome, RecordDecoder};
use crate::error::RejectReason;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct FlatRecord {
    #[serde(default)]
    entity_key: Option<String>,
    #[serde(default)]
    event_time: Value,
    event_id: String,
    #[serde(default)]
    payload: Value,
}

/// Payload is kept as an opaque JSON value.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatEventDecoder;

impl RecordDecoder for FlatEventDecoder {
    type Payload = Value;

    fn decode_line(&self, line_no: usize, line: &str) -> Vec<Outcome<Value>> {
        let rec: FlatRecord = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                return vec![Outcome::rejected(
                    line_no,
                    None,
                    RejectReason::InvalidRecord(e.to_string()),
                )]
            }
        };
        let key = match rec.entity_key.filter(|k| !k.is_empty()) {
            Some(k) => k,
            None => {
                return vec![Outcome::rejected(
                    line_no,
                    Some(rec.event_id.clone()),
                    RejectReason::MissingEntityKey(rec.event_id),
                )]
            }
        };
        let outcome = match parse_timestamp(&rec.event_time) {
            Ok(ts) => Outcome::Valid(Event::new(key, ts, rec.event_id, rec.payload)),
            Err(reason) => Outcome::rejected(line_no, Some(rec.event_id), reason),
        };
        vec![outcome]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_payload_verbatim() {
        let out = FlatEventDecoder.decode_line(
            1,
            r#"{"entity_key":"A","event_time":0,"event_id":"e1","payload":{"amount":12.5}}"#,
        );
        match &out[..] {
            [Outcome::Valid(e)] => {
                assert_eq!(e.entity_key, "A");
                assert_eq!(e.event_time.timestamp_millis(), 0);
                assert_eq!(e.payload, json!({"amount": 12.5}));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_key_is_rejected() {
        let out = FlatEventDecoder.decode_line(2, r#"{"event_time":0,"event_id":"e2"}"#);
        assert!(matches!(
            &out[..],
            [Outcome::Rejected(r)] if matches!(r.reason, RejectReason::MissingEntityKey(_))
        ));
    }

    #[test]
    fn empty_key_is_rejected() {
        let out = FlatEventDecoder.decode_line(
            3,
            r#"{"entity_key":"","event_time":0,"event_id":"e3"}"#,
        );
        match &out[..] {
            [Outcome::Rejected(r)] => {
                assert_eq!(r.line, 3);
                assert_eq!(r.event_id.as_deref(), Some("e3"));
                assert_eq!(r.reason, RejectReason::MissingEntityKey("e3".into()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
