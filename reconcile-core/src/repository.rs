//! The storage interface the matching engine is built against, and an
//! in-memory reference implementation.
//!
//! Mirrors the shape of a nonce store: a narrow trait the reconcilers
//! depend on, with one concurrency-safe in-memory implementation behind
//! it. Here the trait covers three related collections instead of one,
//! because links, payments and transactions must be mutated together —
//! see the single-mutex serialization note on [`InMemoryRepository`].

use std::sync::Mutex;

use chrono::Utc;
use indexmap::IndexMap;

use crate::error::ReconcileError;
use crate::payment::{Payment, PaymentInput, PaymentStatus, ReconciliationLink, Transaction, TransactionInput};

/// Optional filters for [`Repository::get_all_payments`].
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter<'a> {
    pub currency: Option<&'a str>,
    pub status_in: Option<&'a [PaymentStatus]>,
}

/// Persistent, ordered, concurrency-safe store for payments,
/// transactions, and reconciliation links.
///
/// Implementations must serialize all mutating operations with respect
/// to concurrent readers and writers; reads may observe a consistent
/// snapshot or the latest committed state, but never a torn write.
pub trait Repository: Send + Sync {
    /// Inserts a payment, or returns the existing row if `payment_id`
    /// is already stored (idempotent create).
    fn add_payment(&self, input: PaymentInput) -> Result<Payment, ReconcileError>;
    fn get_payment(&self, payment_id: &str) -> Result<Option<Payment>, ReconcileError>;
    fn update_payment_received(
        &self,
        payment_id: &str,
        delta: rust_decimal::Decimal,
        fee_tolerance_percent: rust_decimal::Decimal,
    ) -> Result<Option<Payment>, ReconcileError>;
    fn get_all_payments(&self, filter: PaymentFilter<'_>) -> Result<Vec<Payment>, ReconcileError>;

    /// Inserts a transaction, or returns the existing row if
    /// `transaction_id` is already stored (idempotent create).
    fn add_transaction(&self, input: TransactionInput) -> Result<Transaction, ReconcileError>;
    fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>, ReconcileError>;
    fn mark_transaction_matched(
        &self,
        transaction_id: &str,
        payment_id: &str,
    ) -> Result<(), ReconcileError>;
    fn get_unmatched_transactions(&self) -> Result<Vec<Transaction>, ReconcileError>;

    fn add_reconciliation_link(
        &self,
        payment_id: &str,
        transaction_id: &str,
        match_type: crate::payment::MatchType,
        amount: rust_decimal::Decimal,
    ) -> Result<ReconciliationLink, ReconcileError>;
    fn get_links_for_payment(
        &self,
        payment_id: &str,
    ) -> Result<Vec<ReconciliationLink>, ReconcileError>;
    fn get_all_reconciliation_links(&self) -> Result<Vec<ReconciliationLink>, ReconcileError>;
}

struct Inner {
    payments: IndexMap<String, Payment>,
    transactions: IndexMap<String, Transaction>,
    links: Vec<ReconciliationLink>,
    next_link_seq: u64,
}

/// In-memory [`Repository`], backed by a single [`Mutex`] guarding all
/// three collections together.
///
/// This is coarser than per-collection locking — a read of
/// `get_all_payments` blocks a concurrent `add_transaction` — but it is
/// what the reconciliation workload needs: every ingest path is
/// read-then-write across payments, transactions and links at once, and
/// the workload is write-light, so one lock held for the duration of a
/// single event's reconciliation eliminates phantom matches without
/// meaningfully hurting throughput.
pub struct InMemoryRepository {
    inner: Mutex<Inner>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                payments: IndexMap::new(),
                transactions: IndexMap::new(),
                links: Vec::new(),
                next_link_seq: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for InMemoryRepository {
    fn add_payment(&self, input: PaymentInput) -> Result<Payment, ReconcileError> {
        let mut inner = self.lock();
        if let Some(existing) = inner.payments.get(&input.payment_id) {
            return Ok(existing.clone());
        }
        let payment = Payment::new(input, Utc::now());
        inner
            .payments
            .insert(payment.payment_id.clone(), payment.clone());
        Ok(payment)
    }

    fn get_payment(&self, payment_id: &str) -> Result<Option<Payment>, ReconcileError> {
        Ok(self.lock().payments.get(payment_id).cloned())
    }

    fn update_payment_received(
        &self,
        payment_id: &str,
        delta: rust_decimal::Decimal,
        fee_tolerance_percent: rust_decimal::Decimal,
    ) -> Result<Option<Payment>, ReconcileError> {
        let mut inner = self.lock();
        let Some(payment) = inner.payments.get_mut(payment_id) else {
            return Ok(None);
        };
        payment.received_amount += delta;
        payment.status = crate::kernel::calculate_status(
            payment.expected_amount,
            payment.received_amount,
            fee_tolerance_percent,
        );
        payment.updated_at = Utc::now();
        Ok(Some(payment.clone()))
    }

    fn get_all_payments(&self, filter: PaymentFilter<'_>) -> Result<Vec<Payment>, ReconcileError> {
        let inner = self.lock();
        Ok(inner
            .payments
            .values()
            .filter(|p| filter.currency.map_or(true, |c| p.currency == c))
            .filter(|p| {
                filter
                    .status_in
                    .map_or(true, |statuses| statuses.contains(&p.status))
            })
            .cloned()
            .collect())
    }

    fn add_transaction(&self, input: TransactionInput) -> Result<Transaction, ReconcileError> {
        let mut inner = self.lock();
        if let Some(existing) = inner.transactions.get(&input.transaction_id) {
            return Ok(existing.clone());
        }
        let txn = Transaction::new(input, Utc::now());
        inner
            .transactions
            .insert(txn.transaction_id.clone(), txn.clone());
        Ok(txn)
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>, ReconcileError> {
        Ok(self.lock().transactions.get(transaction_id).cloned())
    }

    fn mark_transaction_matched(
        &self,
        transaction_id: &str,
        payment_id: &str,
    ) -> Result<(), ReconcileError> {
        let mut inner = self.lock();
        if let Some(txn) = inner.transactions.get_mut(transaction_id) {
            txn.matched = true;
            txn.matched_to_payment_id = Some(payment_id.to_string());
        }
        Ok(())
    }

    fn get_unmatched_transactions(&self) -> Result<Vec<Transaction>, ReconcileError> {
        let inner = self.lock();
        Ok(inner
            .transactions
            .values()
            .filter(|t| !t.matched)
            .cloned()
            .collect())
    }

    fn add_reconciliation_link(
        &self,
        payment_id: &str,
        transaction_id: &str,
        match_type: crate::payment::MatchType,
        amount: rust_decimal::Decimal,
    ) -> Result<ReconciliationLink, ReconcileError> {
        let mut inner = self.lock();
        let seq = inner.next_link_seq;
        inner.next_link_seq += 1;
        let link = ReconciliationLink {
            link_id: format!("link_{seq}_{}", uuid::Uuid::new_v4().simple()),
            payment_id: payment_id.to_string(),
            transaction_id: transaction_id.to_string(),
            match_type,
            amount,
            notes: (amount < rust_decimal::Decimal::ZERO).then(|| "Refund".to_string()),
            created_at: Utc::now(),
        };
        inner.links.push(link.clone());
        Ok(link)
    }

    fn get_links_for_payment(
        &self,
        payment_id: &str,
    ) -> Result<Vec<ReconciliationLink>, ReconcileError> {
        let inner = self.lock();
        Ok(inner
            .links
            .iter()
            .filter(|l| l.payment_id == payment_id)
            .cloned()
            .collect())
    }

    fn get_all_reconciliation_links(&self) -> Result<Vec<ReconciliationLink>, ReconcileError> {
        Ok(self.lock().links.clone())
    }
}
