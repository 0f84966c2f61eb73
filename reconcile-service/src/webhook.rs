//! Inbound webhook payload shapes and the ingest handlers that turn a
//! signature-verified webhook body into a stored entity plus a
//! reconciliation pass.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use reconcile_core::{reconciler, MatchType, PaymentInput, ReconcileError, Repository, TransactionInput};

use crate::metrics;

fn match_type_label(match_type: MatchType) -> &'static str {
    match match_type {
        MatchType::Exact => "EXACT",
        MatchType::FuzzyRef => "FUZZY_REF",
        MatchType::AmountOnly => "AMOUNT_ONLY",
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCreatedPayload {
    pub event_type: String,
    pub payment_id: String,
    pub reference: Option<String>,
    pub expected_amount: Decimal,
    pub currency: String,
    pub payer_name: Option<String>,
    pub payer_email: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub sandbox_id: String,
}

impl From<PaymentCreatedPayload> for PaymentInput {
    fn from(p: PaymentCreatedPayload) -> Self {
        PaymentInput {
            payment_id: p.payment_id,
            reference: p.reference,
            expected_amount: p.expected_amount,
            currency: p.currency,
            payer_name: p.payer_name,
            payer_email: p.payer_email,
            due_date: p.due_date,
            description: p.description,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionSettledPayload {
    pub event_type: String,
    pub transaction_id: String,
    pub reference: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub payer_name: Option<String>,
    pub payer_account_last_four: Option<String>,
    pub settled_at: DateTime<Utc>,
    pub bank_reference: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub sandbox_id: String,
}

impl From<TransactionSettledPayload> for TransactionInput {
    fn from(t: TransactionSettledPayload) -> Self {
        TransactionInput {
            transaction_id: t.transaction_id,
            reference: t.reference,
            amount: t.amount,
            currency: t.currency,
            payer_name: t.payer_name,
            payer_account_last_four: t.payer_account_last_four,
            settled_at: t.settled_at,
            bank_reference: t.bank_reference,
        }
    }
}

/// Outcome of a single ingest call, used to pick the right metric and
/// log line.
#[derive(Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    Stored,
    Duplicate,
}

/// Stores a `payment.created` event and retroactively matches unmatched
/// transactions against it. Idempotent on `payment_id`.
pub fn ingest_payment(
    repo: &dyn Repository,
    payload: PaymentCreatedPayload,
    fee_tolerance_percent: Decimal,
) -> Result<IngestOutcome, ReconcileError> {
    if repo.get_payment(&payload.payment_id)?.is_some() {
        tracing::info!(
            payment_id = %payload.payment_id,
            "payment.created already ingested, skipping"
        );
        return Ok(IngestOutcome::Duplicate);
    }
    let payment = repo.add_payment(payload.into())?;
    let matched = reconciler::reconcile_payment(repo, &payment, fee_tolerance_percent)?;
    if matched.is_empty() {
        metrics::MATCH_OUTCOMES
            .with_label_values(&["unmatched", "none"])
            .inc();
    } else {
        for match_type in &matched {
            metrics::MATCH_OUTCOMES
                .with_label_values(&["matched", match_type_label(*match_type)])
                .inc();
        }
        tracing::info!(
            payment_id = %payment.payment_id,
            matched = matched.len(),
            "retroactively matched transactions on payment ingest"
        );
    }
    Ok(IngestOutcome::Stored)
}

/// Stores a `transaction.settled` event and attempts to match it
/// against a known payment. Idempotent on `transaction_id`.
pub fn ingest_transaction(
    repo: &dyn Repository,
    payload: TransactionSettledPayload,
    fee_tolerance_percent: Decimal,
) -> Result<IngestOutcome, ReconcileError> {
    if repo.get_transaction(&payload.transaction_id)?.is_some() {
        tracing::info!(
            transaction_id = %payload.transaction_id,
            "transaction.settled already ingested, skipping"
        );
        return Ok(IngestOutcome::Duplicate);
    }
    let txn = repo.add_transaction(payload.into())?;
    let reconciled = reconciler::reconcile_transaction(repo, &txn, fee_tolerance_percent)?;
    match reconciled {
        Some(match_type) => {
            metrics::MATCH_OUTCOMES
                .with_label_values(&["matched", match_type_label(match_type)])
                .inc();
        }
        None => {
            metrics::MATCH_OUTCOMES
                .with_label_values(&["unmatched", "none"])
                .inc();
        }
    }
    tracing::info!(
        transaction_id = %txn.transaction_id,
        reconciled = reconciled.is_some(),
        "processed transaction webhook"
    );
    Ok(IngestOutcome::Stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reconcile_core::InMemoryRepository;
    use rust_decimal_macros::dec;

    fn payment_payload(id: &str) -> PaymentCreatedPayload {
        PaymentCreatedPayload {
            event_type: "payment.created".to_string(),
            payment_id: id.to_string(),
            reference: Some("INV-1".to_string()),
            expected_amount: dec!(100),
            currency: "USD".to_string(),
            payer_name: None,
            payer_email: None,
            due_date: None,
            description: None,
            timestamp: Utc::now(),
            sandbox_id: "sbx_1".to_string(),
        }
    }

    #[test]
    fn ingest_payment_is_idempotent() {
        let repo = InMemoryRepository::new();
        assert_eq!(
            ingest_payment(&repo, payment_payload("pay_1"), dec!(0)).unwrap(),
            IngestOutcome::Stored
        );
        assert_eq!(
            ingest_payment(&repo, payment_payload("pay_1"), dec!(0)).unwrap(),
            IngestOutcome::Duplicate
        );
        assert_eq!(repo.get_all_payments(Default::default()).unwrap().len(), 1);
    }

    #[test]
    fn ingest_transaction_matches_existing_payment() {
        let repo = InMemoryRepository::new();
        ingest_payment(&repo, payment_payload("pay_1"), dec!(0)).unwrap();

        let txn_payload = TransactionSettledPayload {
            event_type: "transaction.settled".to_string(),
            transaction_id: "txn_1".to_string(),
            reference: Some("INV-1".to_string()),
            amount: dec!(100),
            currency: "USD".to_string(),
            payer_name: None,
            payer_account_last_four: None,
            settled_at: Utc::now(),
            bank_reference: None,
            timestamp: Utc::now(),
            sandbox_id: "sbx_1".to_string(),
        };
        assert_eq!(
            ingest_transaction(&repo, txn_payload, dec!(0)).unwrap(),
            IngestOutcome::Stored
        );
        let payment = repo.get_payment("pay_1").unwrap().unwrap();
        assert_eq!(payment.status, reconcile_core::PaymentStatus::FullyPaid);
    }

    #[test]
    fn ingest_transaction_is_idempotent() {
        let repo = InMemoryRepository::new();
        let txn_payload = TransactionSettledPayload {
            event_type: "transaction.settled".to_string(),
            transaction_id: "txn_1".to_string(),
            reference: Some("INV-1".to_string()),
            amount: dec!(100),
            currency: "USD".to_string(),
            payer_name: None,
            payer_account_last_four: None,
            settled_at: Utc::now(),
            bank_reference: None,
            timestamp: Utc::now(),
            sandbox_id: "sbx_1".to_string(),
        };
        assert_eq!(
            ingest_transaction(&repo, txn_payload.clone(), dec!(0)).unwrap(),
            IngestOutcome::Stored
        );
        assert_eq!(
            ingest_transaction(&repo, txn_payload, dec!(0)).unwrap(),
            IngestOutcome::Duplicate
        );
        assert_eq!(
            repo.get_unmatched_transactions().unwrap().len()
                + repo.get_all_reconciliation_links().unwrap().len(),
            1
        );
    }
}
