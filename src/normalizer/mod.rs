//! Event normalization: raw JSON Lines records → flat keyed events or typed rejections.
//! Decoders are line-oriented; [`Normalizer`] drives one lazily over a reader.

mod customer;
mod flat;
mod timestamp;

use crate::error::RejectReason;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::BufRead;

pub use customer::CustomerDecoder;
pub use flat::FlatEventDecoder;
pub use timestamp::parse_timestamp;

/// One keyed, time-stamped event. The payload is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<P = TransactionPayload> {
    pub entity_key: String,
    pub event_time: DateTime<Utc>,
    pub event_id: String,
    pub payload: P,
}

/// Payload for events decoded from customer records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub transaction_id: String,
    /// Customer-level fraud label, copied to each of the customer's transactions
    #[serde(default)]
    pub fraudulent: Option<bool>,
}

impl<P> Event<P> {
    pub fn new(
        entity_key: impl Into<String>,
        event_time: DateTime<Utc>,
        event_id: impl Into<String>,
        payload: P,
    ) -> Self {
        Self {
            entity_key: entity_key.into(),
            event_time,
            event_id: event_id.into(),
            payload,
        }
    }
}

/// A record that never reached the engine, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// 1-based input line
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<P> {
    Valid(Event<P>),
    Rejected(Rejection),
}

impl<P> Outcome<P> {
    pub fn rejected(line: usize, event_id: Option<String>, reason: RejectReason) -> Self {
        Outcome::Rejected(Rejection {
            line,
            event_id,
            reason,
        })
    }
}

/// Turns one input line into zero or more outcomes.
pub trait RecordDecoder {
    type Payload;

    fn decode_line(&self, line_no: usize, line: &str) -> Vec<Outcome<Self::Payload>>;
}

/// Lazy iterator of outcomes over a line reader. Blank lines are skipped; a
/// line that is not UTF-8 is rejected on its own. Read failures are fatal.
pub struct Normalizer<R, D: RecordDecoder> {
    reader: R,
    decoder: D,
    buf: Vec<u8>,
    line_no: usize,
    pending: VecDeque<Outcome<D::Payload>>,
}

impl<R: BufRead, D: RecordDecoder> Normalizer<R, D> {
    pub fn new(reader: R, decoder: D) -> Self {
        Self {
            reader,
            decoder,
            buf: Vec::new(),
            line_no: 0,
            pending: VecDeque::new(),
        }
    }

    /// Input lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead, D: RecordDecoder> Iterator for Normalizer<R, D> {
    type Item = std::io::Result<Outcome<D::Payload>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(o) = self.pending.pop_front() {
                return Some(Ok(o));
            }
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }
            self.line_no += 1;
            let line = match std::str::from_utf8(&self.buf) {
                Ok(l) => l,
                Err(e) => {
                    return Some(Ok(Outcome::rejected(
                        self.line_no,
                        None,
                        RejectReason::InvalidRecord(format!("line is not valid UTF-8: {}", e)),
                    )))
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let decoded = self.decoder.decode_line(self.line_no, trimmed);
            self.pending.extend(decoded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn non_utf8_line_is_rejected_and_reading_continues() {
        let mut input = br#"{"entity_key":"A","event_time":0,"event_id":"e1"}"#.to_vec();
        input.extend_from_slice(b"\n{\"entity_key\":\"A\xff\",\"event_time\":1,\"event_id\":\"bad\"}\n");
        input.extend_from_slice(br#"{"entity_key":"A","event_time":2,"event_id":"e2"}"#);

        let mut normalizer = Normalizer::new(Cursor::new(input), FlatEventDecoder);
        let outcomes = normalizer
            .by_ref()
            .collect::<std::io::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(normalizer.lines_read(), 3);

        let valid: Vec<&str> = outcomes
            .iter()
            .filter_map(|o| match o {
                Outcome::Valid(e) => Some(e.event_id.as_str()),
                Outcome::Rejected(_) => None,
            })
            .collect();
        assert_eq!(valid, vec!["e1", "e2"]);
        assert!(matches!(
            &outcomes[1],
            Outcome::Rejected(r) if r.line == 2 && matches!(r.reason, RejectReason::InvalidRecord(_))
        ));
    }

    #[test]
    fn blank_lines_are_counted_but_skipped() {
        let input = "\n  \n{\"entity_key\":\"A\",\"event_time\":0,\"event_id\":\"e1\"}\r\n";
        let mut normalizer = Normalizer::new(Cursor::new(input), FlatEventDecoder);
        let outcomes = normalizer
            .by_ref()
            .collect::<std::io::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(normalizer.lines_read(), 3);
    }
}
