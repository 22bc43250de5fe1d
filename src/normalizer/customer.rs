//! Customer records: one JSON object per line holding the customer's payment
//! methods, transactions, and a customer-level fraud label.

use super::{parse_timestamp, Event, Outcome, RecordDecoder, TransactionPayload};
use crate::error::RejectReason;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerRecord {
    #[serde(default)]
    payment_methods: Vec<PaymentMethod>,
    #[serde(default)]
    transactions: Vec<Value>,
    #[serde(default)]
    fraudulent: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentMethod {
    payment_method_id: String,
    #[serde(default)]
    payment_method_issuer: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    transaction_id: String,
    payment_method_id: String,
    #[serde(default)]
    logged_at: Value,
}

/// Keys each transaction by the issuer of the payment method it used.
#[derive(Debug, Default, Clone, Copy)]
pub struct CustomerDecoder;

impl RecordDecoder for CustomerDecoder {
    type Payload = TransactionPayload;

    fn decode_line(&self, line_no: usize, line: &str) -> Vec<Outcome<TransactionPayload>> {
        let record: CustomerRecord = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                return vec![Outcome::rejected(
                    line_no,
                    None,
                    RejectReason::InvalidRecord(e.to_string()),
                )]
            }
        };

        // A later entry for the same payment method replaces an earlier one
        let issuers: HashMap<&str, &str> = record
            .payment_methods
            .iter()
            .map(|pm| {
                (
                    pm.payment_method_id.as_str(),
                    pm.payment_method_issuer.as_deref().unwrap_or(""),
                )
            })
            .collect();

        record
            .transactions
            .into_iter()
            .map(|raw| {
                let tx: RawTransaction = match serde_json::from_value(raw) {
                    Ok(tx) => tx,
                    Err(e) => {
                        return Outcome::rejected(
                            line_no,
                            None,
                            RejectReason::InvalidRecord(e.to_string()),
                        )
                    }
                };
                let issuer = issuers
                    .get(tx.payment_method_id.as_str())
                    .filter(|issuer| !issuer.is_empty());
                let Some(issuer) = issuer else {
                    return Outcome::rejected(
                        line_no,
                        Some(tx.transaction_id),
                        RejectReason::MissingEntityKey(tx.payment_method_id),
                    );
                };
                match parse_timestamp(&tx.logged_at) {
                    Ok(ts) => Outcome::Valid(Event::new(
                        *issuer,
                        ts,
                        tx.transaction_id.clone(),
                        TransactionPayload {
                            transaction_id: tx.transaction_id,
                            fraudulent: record.fraudulent,
                        },
                    )),
                    Err(reason) => Outcome::rejected(line_no, Some(tx.transaction_id), reason),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"{
        "fraudulent": true,
        "paymentMethods": [
            {"paymentMethodId": "pm1", "paymentMethodIssuer": "Citizens First Banks"},
            {"paymentMethodId": "pm2", "paymentMethodIssuer": ""}
        ],
        "transactions": [
            {"transactionId": "t1", "paymentMethodId": "pm1", "loggedAt": "2019-02-01T10:00:00Z"},
            {"transactionId": "t2", "paymentMethodId": "pm2", "loggedAt": "2019-02-01T11:00:00Z"},
            {"transactionId": "t3", "paymentMethodId": "pm1", "loggedAt": "not a time"},
            {"transactionId": "t4", "paymentMethodId": "pm9", "loggedAt": "2019-02-01T12:00:00Z"}
        ]
    }"#;

    #[test]
    fn decodes_each_transaction_to_one_outcome() {
        let line = LINE.replace('\n', " ");
        let out = CustomerDecoder.decode_line(7, &line);
        assert_eq!(out.len(), 4);

        match &out[0] {
            Outcome::Valid(e) => {
                assert_eq!(e.entity_key, "Citizens First Banks");
                assert_eq!(e.event_id, "t1");
                assert_eq!(e.payload.fraudulent, Some(true));
            }
            other => panic!("expected valid event, got {:?}", other),
        }
        match &out[1] {
            Outcome::Rejected(r) => {
                assert_eq!(r.line, 7);
                assert_eq!(r.reason, RejectReason::MissingEntityKey("pm2".into()));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert!(matches!(
            &out[2],
            Outcome::Rejected(r) if matches!(r.reason, RejectReason::UnparsableTimestamp(_))
        ));
        assert!(matches!(
            &out[3],
            Outcome::Rejected(r) if r.event_id.as_deref() == Some("t4")
        ));
    }

    #[test]
    fn bad_json_rejects_the_line() {
        let out = CustomerDecoder.decode_line(3, "{not json");
        assert_eq!(out.len(), 1);
        assert!(matches!(
            &out[0],
            Outcome::Rejected(r) if r.line == 3 && matches!(r.reason, RejectReason::InvalidRecord(_))
        ));
    }

    #[test]
    fn customer_without_transactions_yields_nothing() {
        let out = CustomerDecoder.decode_line(1, r#"{"paymentMethods": []}"#);
        assert!(out.is_empty());
    }

    #[test]
    fn duplicate_payment_method_last_entry_wins() {
        let line = r#"{"paymentMethods": [
            {"paymentMethodId": "pm1", "paymentMethodIssuer": "BankA"},
            {"paymentMethodId": "pm1", "paymentMethodIssuer": ""}
        ], "transactions": [
            {"transactionId": "t1", "paymentMethodId": "pm1", "loggedAt": "2019-02-01T10:00:00Z"}
        ]}"#
        .replace('\n', " ");
        let out = CustomerDecoder.decode_line(1, &line);
        assert_eq!(out.len(), 1);
        assert!(matches!(
            &out[0],
            Outcome::Rejected(r) if r.reason == RejectReason::MissingEntityKey("pm1".into())
        ));

        let line = r#"{"paymentMethods": [
            {"paymentMethodId": "pm1", "paymentMethodIssuer": ""},
            {"paymentMethodId": "pm1", "paymentMethodIssuer": "BankB"}
        ], "transactions": [
            {"transactionId": "t1", "paymentMethodId": "pm1", "loggedAt": "2019-02-01T10:00:00Z"}
        ]}"#
        .replace('\n', " ");
        let out = CustomerDecoder.decode_line(1, &line);
        assert!(matches!(&out[..], [Outcome::Valid(e)] if e.entity_key == "BankB"));
    }

    #[test]
    fn transaction_missing_ids_is_an_invalid_record() {
        let line = r#"{"paymentMethods": [
            {"paymentMethodId": "pm1", "paymentMethodIssuer": "BankA"}
        ], "transactions": [
            {"paymentMethodId": "pm1", "loggedAt": "2019-02-01T10:00:00Z"},
            {"transactionId": "t2", "loggedAt": "2019-02-01T10:00:00Z"},
            {"transactionId": "t3", "paymentMethodId": "pm1", "loggedAt": "2019-02-01T11:00:00Z"}
        ]}"#
        .replace('\n', " ");
        let out = CustomerDecoder.decode_line(4, &line);
        assert_eq!(out.len(), 3);
        for o in &out[..2] {
            assert!(matches!(
                o,
                Outcome::Rejected(r) if r.line == 4
                    && r.event_id.is_none()
                    && matches!(r.reason, RejectReason::InvalidRecord(_))
            ));
        }
        assert!(matches!(&out[2], Outcome::Valid(e) if e.event_id == "t3"));
    }
}
