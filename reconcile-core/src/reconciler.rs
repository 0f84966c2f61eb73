//! Transaction and payment reconcilers: the two entry points that turn
//! a newly-ingested entity into zero or more reconciliation links.
//!
//! Both are plain functions over `&dyn Repository` and the new entity —
//! there is no reconciler object or trait, since there is no state to
//! hold beyond what the repository already owns.

use rust_decimal::Decimal;

use crate::error::ReconcileError;
use crate::kernel::{amount_matches_remaining, match_reference, payer_matches};
use crate::payment::{MatchType, Payment, PaymentStatus, Transaction};
use crate::repository::{PaymentFilter, Repository};

const OPEN_STATUSES: [PaymentStatus; 2] = [PaymentStatus::Pending, PaymentStatus::PartiallyPaid];

/// Finds at most one payment for a newly-stored transaction, links it,
/// and updates the payment's received amount and status. Returns the
/// match type of the link created, or `None` if nothing matched.
///
/// Stops at the first rule that finds a payment: reference match, then
/// payer+amount match (only when no reference was given), then
/// refund-by-payer (only for negative amounts). A transaction that
/// matches nothing stays unmatched and is revisited when a later
/// payment is ingested by [`reconcile_payment`].
pub fn reconcile_transaction(
    repo: &dyn Repository,
    txn: &Transaction,
    fee_tolerance_percent: Decimal,
) -> Result<Option<MatchType>, ReconcileError> {
    let Some((payment, match_type)) = find_payment_for_transaction(repo, txn, fee_tolerance_percent)?
    else {
        return Ok(None);
    };

    link_and_update(repo, &payment, txn.transaction_id.as_str(), match_type, txn.amount, fee_tolerance_percent)?;
    Ok(Some(match_type))
}

fn find_payment_for_transaction(
    repo: &dyn Repository,
    txn: &Transaction,
    fee_tolerance_percent: Decimal,
) -> Result<Option<(Payment, MatchType)>, ReconcileError> {
    if let Some(found) = match_by_reference(repo, txn)? {
        return Ok(Some(found));
    }
    if txn.reference.is_none() {
        if let Some(found) = match_by_payer_amount(repo, txn, fee_tolerance_percent)? {
            return Ok(Some(found));
        }
    }
    if txn.amount < Decimal::ZERO {
        if let Some(found) = match_refund_by_payer(repo, txn)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn match_by_reference(
    repo: &dyn Repository,
    txn: &Transaction,
) -> Result<Option<(Payment, MatchType)>, ReconcileError> {
    if txn.reference.is_none() {
        return Ok(None);
    }
    let candidates = repo.get_all_payments(PaymentFilter {
        currency: Some(&txn.currency),
        status_in: None,
    })?;
    for p in candidates {
        if let Some(match_type) = match_reference(txn.reference.as_deref(), p.reference.as_deref()) {
            return Ok(Some((p, match_type)));
        }
    }
    Ok(None)
}

fn match_by_payer_amount(
    repo: &dyn Repository,
    txn: &Transaction,
    fee_tolerance_percent: Decimal,
) -> Result<Option<(Payment, MatchType)>, ReconcileError> {
    let candidates = repo.get_all_payments(PaymentFilter {
        currency: Some(&txn.currency),
        status_in: Some(&OPEN_STATUSES),
    })?;
    for p in candidates {
        if !payer_matches(txn.payer_name.as_deref(), p.payer_name.as_deref()) {
            continue;
        }
        if amount_matches_remaining(
            txn.amount.abs(),
            p.expected_amount,
            p.received_amount,
            fee_tolerance_percent,
        ) {
            return Ok(Some((p, MatchType::AmountOnly)));
        }
    }
    Ok(None)
}

fn match_refund_by_payer(
    repo: &dyn Repository,
    txn: &Transaction,
) -> Result<Option<(Payment, MatchType)>, ReconcileError> {
    for link in repo.get_all_reconciliation_links()? {
        let Some(p) = repo.get_payment(&link.payment_id)? else {
            continue;
        };
        if p.currency != txn.currency {
            continue;
        }
        if payer_matches(txn.payer_name.as_deref(), p.payer_name.as_deref()) {
            return Ok(Some((p, MatchType::Exact)));
        }
    }
    Ok(None)
}

/// Walks unmatched transactions and retroactively links those that now
/// match a newly-stored payment. Returns the match type of every link
/// created, in the order the transactions were visited.
///
/// Deliberately excludes the refund-by-payer rule: a refund arriving
/// before the payment it refunds is not yet meaningful.
pub fn reconcile_payment(
    repo: &dyn Repository,
    payment: &Payment,
    fee_tolerance_percent: Decimal,
) -> Result<Vec<MatchType>, ReconcileError> {
    let mut matches = Vec::new();
    for txn in repo.get_unmatched_transactions()? {
        if txn.currency != payment.currency {
            continue;
        }
        let Some(match_type) =
            check_match(repo, &txn, payment, fee_tolerance_percent)?
        else {
            continue;
        };
        link_and_update(
            repo,
            payment,
            txn.transaction_id.as_str(),
            match_type,
            txn.amount,
            fee_tolerance_percent,
        )?;
        matches.push(match_type);
    }
    Ok(matches)
}

fn check_match(
    repo: &dyn Repository,
    txn: &Transaction,
    payment: &Payment,
    fee_tolerance_percent: Decimal,
) -> Result<Option<MatchType>, ReconcileError> {
    if let Some(match_type) = match_reference(txn.reference.as_deref(), payment.reference.as_deref()) {
        return Ok(Some(match_type));
    }
    if txn.reference.is_some() || txn.amount <= Decimal::ZERO {
        return Ok(None);
    }
    if !payer_matches(txn.payer_name.as_deref(), payment.payer_name.as_deref()) {
        return Ok(None);
    }
    // Earlier iterations in this same call may have mutated the payment
    // (received amount, status), so re-read it rather than trust the
    // caller's snapshot.
    let Some(current) = repo.get_payment(&payment.payment_id)? else {
        return Ok(None);
    };
    if !OPEN_STATUSES.contains(&current.status) {
        return Ok(None);
    }
    if amount_matches_remaining(
        txn.amount.abs(),
        current.expected_amount,
        current.received_amount,
        fee_tolerance_percent,
    ) {
        return Ok(Some(MatchType::AmountOnly));
    }
    Ok(None)
}

fn link_and_update(
    repo: &dyn Repository,
    payment: &Payment,
    transaction_id: &str,
    match_type: MatchType,
    amount: Decimal,
    fee_tolerance_percent: Decimal,
) -> Result<(), ReconcileError> {
    repo.add_reconciliation_link(&payment.payment_id, transaction_id, match_type, amount)?;
    repo.mark_transaction_matched(transaction_id, &payment.payment_id)?;
    repo.update_payment_received(&payment.payment_id, amount, fee_tolerance_percent)?;
    Ok(())
}
