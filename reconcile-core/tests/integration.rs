//! Cross-component scenarios exercising the repository and both
//! reconcilers together. Pure matching-function behavior is covered
//! in-module next to `kernel`; these scenarios are end-to-end on
//! purpose.

use chrono::Utc;
use reconcile_core::reconciler::{reconcile_payment, reconcile_transaction};
use reconcile_core::{
    InMemoryRepository, MatchType, Payment, PaymentInput, PaymentStatus, Repository,
    TransactionInput,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TOL: Decimal = dec!(1);

fn repo_with_payment(
    reference: Option<&str>,
    payer: Option<&str>,
    expected: Decimal,
) -> (InMemoryRepository, Payment) {
    let repo = InMemoryRepository::new();
    let p = repo
        .add_payment(PaymentInput {
            payment_id: "pay_1".to_string(),
            reference: reference.map(|s| s.to_string()),
            expected_amount: expected,
            currency: "USD".to_string(),
            payer_name: payer.map(|s| s.to_string()),
            payer_email: None,
            due_date: None,
            description: None,
        })
        .unwrap();
    (repo, p)
}

#[test]
fn scenario_a_fuzzy_ref_match() {
    let (repo, _) = repo_with_payment(Some("INV-1"), None, dec!(1000));
    let t1 = repo
        .add_transaction(TransactionInput {
            transaction_id: "txn_1".to_string(),
            reference: Some("inv1".to_string()),
            amount: dec!(1000),
            currency: "USD".to_string(),
            payer_name: None,
            payer_account_last_four: None,
            settled_at: Utc::now(),
            bank_reference: None,
        })
        .unwrap();
    assert_eq!(
        reconcile_transaction(&repo, &t1, TOL).unwrap(),
        Some(MatchType::FuzzyRef)
    );
    let payment = repo.get_payment("pay_1").unwrap().unwrap();
    assert_eq!(payment.received_amount, dec!(1000));
    assert_eq!(payment.status, PaymentStatus::FullyPaid);
    let links = repo.get_links_for_payment("pay_1").unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].match_type, MatchType::FuzzyRef);
}

#[test]
fn scenario_b_two_exact_partial_payments_sum_to_full() {
    let (repo, _) = repo_with_payment(Some("INV-2"), None, dec!(1000));
    for (id, amount) in [("txn_1", dec!(400)), ("txn_2", dec!(600))] {
        let t = repo
            .add_transaction(TransactionInput {
                transaction_id: id.to_string(),
                reference: Some("INV-2".to_string()),
                amount,
                currency: "USD".to_string(),
                payer_name: None,
                payer_account_last_four: None,
                settled_at: Utc::now(),
                bank_reference: None,
            })
            .unwrap();
        assert!(reconcile_transaction(&repo, &t, TOL).unwrap().is_some());
    }
    let payment = repo.get_payment("pay_1").unwrap().unwrap();
    assert_eq!(payment.received_amount, dec!(1000));
    assert_eq!(payment.status, PaymentStatus::FullyPaid);
    assert_eq!(repo.get_all_reconciliation_links().unwrap().len(), 2);
}

#[test]
fn scenario_c_transaction_before_payment_matches_retroactively() {
    let repo = InMemoryRepository::new();
    let t1 = repo
        .add_transaction(TransactionInput {
            transaction_id: "txn_1".to_string(),
            reference: Some("INV-3".to_string()),
            amount: dec!(500),
            currency: "USD".to_string(),
            payer_name: None,
            payer_account_last_four: None,
            settled_at: Utc::now(),
            bank_reference: None,
        })
        .unwrap();
    assert_eq!(reconcile_transaction(&repo, &t1, TOL).unwrap(), None);

    let payment = repo
        .add_payment(PaymentInput {
            payment_id: "pay_1".to_string(),
            reference: Some("INV-3".to_string()),
            expected_amount: dec!(500),
            currency: "USD".to_string(),
            payer_name: None,
            payer_email: None,
            due_date: None,
            description: None,
        })
        .unwrap();
    let matched = reconcile_payment(&repo, &payment, TOL).unwrap();
    assert_eq!(matched, vec![MatchType::Exact]);
    let links = repo.get_links_for_payment("pay_1").unwrap();
    assert_eq!(links[0].match_type, MatchType::Exact);
    let payment = repo.get_payment("pay_1").unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::FullyPaid);
}

#[test]
fn scenario_d_payer_and_amount_only_match() {
    let (repo, _) = repo_with_payment(Some("X"), Some("Acme Corp"), dec!(1000));
    let t1 = repo
        .add_transaction(TransactionInput {
            transaction_id: "txn_1".to_string(),
            reference: None,
            amount: dec!(1000),
            currency: "USD".to_string(),
            payer_name: Some("acme corp inc".to_string()),
            payer_account_last_four: None,
            settled_at: Utc::now(),
            bank_reference: None,
        })
        .unwrap();
    assert_eq!(
        reconcile_transaction(&repo, &t1, TOL).unwrap(),
        Some(MatchType::AmountOnly)
    );
    let links = repo.get_links_for_payment("pay_1").unwrap();
    assert_eq!(links[0].match_type, MatchType::AmountOnly);
    let payment = repo.get_payment("pay_1").unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::FullyPaid);
}

#[test]
fn scenario_e_overpaid() {
    let (repo, _) = repo_with_payment(Some("Y"), Some("Bob"), dec!(1000));
    let t1 = repo
        .add_transaction(TransactionInput {
            transaction_id: "txn_1".to_string(),
            reference: Some("Y".to_string()),
            amount: dec!(1005),
            currency: "USD".to_string(),
            payer_name: None,
            payer_account_last_four: None,
            settled_at: Utc::now(),
            bank_reference: None,
        })
        .unwrap();
    assert_eq!(
        reconcile_transaction(&repo, &t1, TOL).unwrap(),
        Some(MatchType::Exact)
    );
    let payment = repo.get_payment("pay_1").unwrap().unwrap();
    assert_eq!(payment.received_amount, dec!(1005));
    assert_eq!(payment.status, PaymentStatus::Overpaid);
    let links = repo.get_links_for_payment("pay_1").unwrap();
    assert_eq!(links[0].match_type, MatchType::Exact);
}

#[test]
fn scenario_f_refund_by_payer_drives_payment_back_to_pending() {
    let (repo, _) = repo_with_payment(Some("INV-1"), Some("same payer"), dec!(1000));
    let t1 = repo
        .add_transaction(TransactionInput {
            transaction_id: "txn_1".to_string(),
            reference: Some("inv1".to_string()),
            amount: dec!(1000),
            currency: "USD".to_string(),
            payer_name: None,
            payer_account_last_four: None,
            settled_at: Utc::now(),
            bank_reference: None,
        })
        .unwrap();
    assert!(reconcile_transaction(&repo, &t1, TOL).unwrap().is_some());

    let t2 = repo
        .add_transaction(TransactionInput {
            transaction_id: "txn_2".to_string(),
            reference: None,
            amount: dec!(-1000),
            currency: "USD".to_string(),
            payer_name: Some("same payer".to_string()),
            payer_account_last_four: None,
            settled_at: Utc::now(),
            bank_reference: None,
        })
        .unwrap();
    assert_eq!(
        reconcile_transaction(&repo, &t2, TOL).unwrap(),
        Some(MatchType::Exact)
    );

    let payment = repo.get_payment("pay_1").unwrap().unwrap();
    assert_eq!(payment.received_amount, dec!(0));
    assert_eq!(payment.status, PaymentStatus::Pending);
    let links = repo.get_links_for_payment("pay_1").unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[1].match_type, MatchType::Exact);
    assert_eq!(links[1].notes.as_deref(), Some("Refund"));
}

#[test]
fn unmatched_transaction_stays_unmatched() {
    let (repo, _) = repo_with_payment(Some("INV-1"), None, dec!(1000));
    let t1 = repo
        .add_transaction(TransactionInput {
            transaction_id: "txn_1".to_string(),
            reference: Some("totally-different".to_string()),
            amount: dec!(50),
            currency: "USD".to_string(),
            payer_name: None,
            payer_account_last_four: None,
            settled_at: Utc::now(),
            bank_reference: None,
        })
        .unwrap();
    assert_eq!(reconcile_transaction(&repo, &t1, TOL).unwrap(), None);
    assert_eq!(repo.get_unmatched_transactions().unwrap().len(), 1);
}
