//! Output assembly: `(event, velocity)` records, optional input-order restore, NDJSON export.

use crate::config::OutputOrder;
use crate::normalizer::{Event, TransactionPayload};
use serde::Serialize;
use std::io::Write;

/// Field name the velocity is exported under
pub const VELOCITY_FIELD: &str = "issuer_velocity_24h";

/// One event with the count of same-key events live in the window before it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityRecord<P = TransactionPayload> {
    /// Position of the event in the original input
    pub index: usize,
    pub event: Event<P>,
    pub velocity: u64,
}

/// Export shape: the event's fields plus `issuer_velocity_24h`
#[derive(Serialize)]
struct Augmented<'a, P> {
    #[serde(flatten)]
    event: &'a Event<P>,
    issuer_velocity_24h: u64,
}

impl<P: Serialize> Serialize for VelocityRecord<P> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Augmented {
            event: &self.event,
            issuer_velocity_24h: self.velocity,
        }
        .serialize(serializer)
    }
}

/// Put records in the requested order. Time order is the processing order and
/// is returned as-is.
pub fn assemble<P>(mut records: Vec<VelocityRecord<P>>, order: OutputOrder) -> Vec<VelocityRecord<P>> {
    if order == OutputOrder::Input {
        records.sort_by_key(|r| r.index);
    }
    records
}

/// Write records as one JSON object per line. Returns lines written.
pub fn write_ndjson<'a, P, W>(
    records: impl IntoIterator<Item = &'a VelocityRecord<P>>,
    w: &mut W,
) -> Result<usize, crate::error::VelocityError>
where
    P: Serialize + 'a,
    W: Write,
{
    let mut n = 0;
    for r in records {
        serde_json::to_writer(&mut *w, r)?;
        w.write_all(b"\n")?;
        n += 1;
    }
    w.flush()?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(index: usize, secs: i64, velocity: u64) -> VelocityRecord {
        VelocityRecord {
            index,
            event: Event::new(
                "Bank",
                Utc.timestamp_opt(secs, 0).unwrap(),
                format!("t{}", index),
                TransactionPayload {
                    transaction_id: format!("t{}", index),
                    fraudulent: Some(false),
                },
            ),
            velocity,
        }
    }

    #[test]
    fn input_order_restores_by_index() {
        let recs = vec![record(2, 0, 0), record(0, 5, 1), record(1, 9, 2)];
        let idx: Vec<usize> = assemble(recs.clone(), OutputOrder::Input)
            .iter()
            .map(|r| r.index)
            .collect();
        assert_eq!(idx, vec![0, 1, 2]);
        assert_eq!(assemble(recs.clone(), OutputOrder::Time), recs);
    }

    #[test]
    fn exported_record_carries_payload_and_velocity() {
        let mut buf = Vec::new();
        let recs = vec![record(0, 0, 3)];
        assert_eq!(write_ndjson(&recs, &mut buf).unwrap(), 1);
        let line = String::from_utf8(buf).unwrap();
        let v: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(v[VELOCITY_FIELD], 3);
        assert_eq!(v["entity_key"], "Bank");
        assert_eq!(v["payload"]["transaction_id"], "t0");
        assert_eq!(v["payload"]["fraudulent"], false);
    }
}
