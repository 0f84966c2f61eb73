//! Core entities for the reconciliation engine: payments, transactions,
//! and the reconciliation links between them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Status of a payment, derived purely from `expected_amount` and
/// `received_amount` — see [`crate::kernel::calculate_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    PartiallyPaid,
    FullyPaid,
    Overpaid,
}

/// Provenance of a [`ReconciliationLink`] — how the matched transaction
/// was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Exact,
    FuzzyRef,
    AmountOnly,
}

/// An expected inflow recorded from a `payment.created` event.
///
/// `received_amount` and `status` are derived state, recomputed by the
/// reconcilers every time a link against this payment is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: String,
    pub reference: Option<String>,
    pub expected_amount: Decimal,
    pub currency: String,
    pub payer_name: Option<String>,
    pub payer_email: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub received_amount: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Builds a freshly-ingested payment: `received_amount` zero,
    /// `status` pending, timestamps set to `now`.
    pub fn new(input: PaymentInput, now: DateTime<Utc>) -> Self {
        Self {
            payment_id: input.payment_id,
            reference: input.reference,
            expected_amount: input.expected_amount,
            currency: input.currency,
            payer_name: input.payer_name,
            payer_email: input.payer_email,
            due_date: input.due_date,
            description: input.description,
            received_amount: Decimal::ZERO,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields supplied by a `payment.created` webhook, before derived state
/// is attached.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    pub payment_id: String,
    pub reference: Option<String>,
    pub expected_amount: Decimal,
    pub currency: String,
    pub payer_name: Option<String>,
    pub payer_email: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// A settled bank movement recorded from a `transaction.settled` event.
///
/// `amount` is signed: negative means refund. `matched`/`matched_to_payment_id`
/// are derived state set the first (and only) time a link is created for
/// this transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub reference: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub payer_name: Option<String>,
    pub payer_account_last_four: Option<String>,
    pub settled_at: DateTime<Utc>,
    pub bank_reference: Option<String>,
    pub matched: bool,
    pub matched_to_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds a freshly-ingested transaction: unmatched.
    pub fn new(input: TransactionInput, now: DateTime<Utc>) -> Self {
        Self {
            transaction_id: input.transaction_id,
            reference: input.reference,
            amount: input.amount,
            currency: input.currency,
            payer_name: input.payer_name,
            payer_account_last_four: input.payer_account_last_four,
            settled_at: input.settled_at,
            bank_reference: input.bank_reference,
            matched: false,
            matched_to_payment_id: None,
            created_at: now,
        }
    }
}

/// Fields supplied by a `transaction.settled` webhook, before derived
/// state is attached.
#[derive(Debug, Clone)]
pub struct TransactionInput {
    pub transaction_id: String,
    pub reference: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub payer_name: Option<String>,
    pub payer_account_last_four: Option<String>,
    pub settled_at: DateTime<Utc>,
    pub bank_reference: Option<String>,
}

/// An append-only audit edge asserting that a transaction satisfies
/// part or all of a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationLink {
    pub link_id: String,
    pub payment_id: String,
    pub transaction_id: String,
    pub match_type: MatchType,
    pub amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
