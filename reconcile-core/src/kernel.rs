//! Pure matching functions: reference normalization, payer matching,
//! amount tolerance, and payment status calculation.
//!
//! None of these functions touch the repository — they operate only on
//! the values passed in, which keeps them trivially unit-testable and
//! lets the reconcilers (`crate::reconciler`) stay thin wiring around them.

use rust_decimal::Decimal;

use crate::payment::{MatchType, PaymentStatus};

/// Lowercase, trim, and strip hyphens from a reference. `None` becomes `""`.
pub fn normalize_ref(r: Option<&str>) -> String {
    match r {
        Some(s) => s.trim().to_lowercase().replace('-', ""),
        None => String::new(),
    }
}

/// Compare a transaction reference against a payment reference.
///
/// Byte-equal after trimming → [`MatchType::Exact`]. Equal after
/// [`normalize_ref`] → [`MatchType::FuzzyRef`]. Otherwise `None`,
/// including when either side is absent or empty.
pub fn match_reference(txn_ref: Option<&str>, payment_ref: Option<&str>) -> Option<MatchType> {
    let (txn_ref, payment_ref) = match (txn_ref, payment_ref) {
        (Some(t), Some(p)) if !t.trim().is_empty() && !p.trim().is_empty() => (t, p),
        _ => return None,
    };

    if txn_ref.trim() == payment_ref.trim() {
        return Some(MatchType::Exact);
    }
    if normalize_ref(Some(txn_ref)) == normalize_ref(Some(payment_ref)) {
        return Some(MatchType::FuzzyRef);
    }
    None
}

/// Case-insensitive substring match between two payer names. Absent or
/// empty inputs never match.
pub fn payer_matches(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => {
            let a = a.to_lowercase();
            let b = b.to_lowercase();
            a == b || a.contains(&b) || b.contains(&a)
        }
        _ => false,
    }
}

/// The fraction of `amount` allowed as under-payment, a concession to
/// bank fees taken off an expected inflow.
pub fn tolerance(amount: Decimal, fee_tolerance_percent: Decimal) -> Decimal {
    amount * fee_tolerance_percent / Decimal::ONE_HUNDRED
}

/// Derive a payment's status purely from its expected and received
/// amounts. Evaluated top-down; the first matching rule wins.
pub fn calculate_status(
    expected: Decimal,
    received: Decimal,
    fee_tolerance_percent: Decimal,
) -> PaymentStatus {
    if received <= Decimal::ZERO {
        return PaymentStatus::Pending;
    }
    if received > expected {
        return PaymentStatus::Overpaid;
    }
    if received >= expected - tolerance(expected, fee_tolerance_percent) {
        return PaymentStatus::FullyPaid;
    }
    PaymentStatus::PartiallyPaid
}

/// True iff `txn_amount` (already absolute-valued by the caller) either
/// falls short of or within tolerance of the payment's remaining
/// balance — an inclusive disjunction that, by design, does not cap how
/// far above `remaining` a transaction amount may land.
pub fn amount_matches_remaining(
    txn_amount: Decimal,
    expected_amount: Decimal,
    received_amount: Decimal,
    fee_tolerance_percent: Decimal,
) -> bool {
    let remaining = expected_amount - received_amount;
    txn_amount <= remaining || txn_amount >= remaining - tolerance(remaining, fee_tolerance_percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn normalize_ref_strips_hyphens_case_and_whitespace() {
        assert_eq!(normalize_ref(Some(" INV-2024-001 ")), "inv2024001");
        assert_eq!(normalize_ref(None), "");
    }

    #[test]
    fn match_reference_prefers_exact_over_fuzzy() {
        assert_eq!(
            match_reference(Some("INV-1"), Some("INV-1")),
            Some(MatchType::Exact)
        );
        assert_eq!(
            match_reference(Some("inv1"), Some("INV-1")),
            Some(MatchType::FuzzyRef)
        );
        assert_eq!(match_reference(Some("INV-1"), None), None);
        assert_eq!(match_reference(None, None), None);
        assert_eq!(match_reference(Some(""), Some("")), None);
    }

    #[test]
    fn payer_matches_is_case_insensitive_substring() {
        assert!(payer_matches(Some("Acme Corp"), Some("acme corp inc")));
        assert!(payer_matches(Some("acme"), Some("Acme")));
        assert!(!payer_matches(Some("Acme"), Some("Globex")));
        assert!(!payer_matches(None, Some("Acme")));
        assert!(!payer_matches(Some(""), Some("")));
    }

    #[test]
    fn calculate_status_precedence() {
        let tol = dec!(1);
        assert_eq!(
            calculate_status(dec!(1000), dec!(0), tol),
            PaymentStatus::Pending
        );
        assert_eq!(
            calculate_status(dec!(1000), dec!(-50), tol),
            PaymentStatus::Pending
        );
        assert_eq!(
            calculate_status(dec!(1000), dec!(1005), tol),
            PaymentStatus::Overpaid
        );
        assert_eq!(
            calculate_status(dec!(1000), dec!(995), tol),
            PaymentStatus::FullyPaid
        );
        assert_eq!(
            calculate_status(dec!(1000), dec!(500), tol),
            PaymentStatus::PartiallyPaid
        );
    }

    #[test]
    fn amount_matches_remaining_admits_under_and_over_tolerance() {
        let tol = dec!(1);
        // exactly remaining
        assert!(amount_matches_remaining(dec!(500), dec!(1000), dec!(500), tol));
        // under remaining
        assert!(amount_matches_remaining(dec!(400), dec!(1000), dec!(500), tol));
        // far above remaining: disjunction's upper bound is effectively unbounded
        assert!(amount_matches_remaining(dec!(10_000), dec!(1000), dec!(500), tol));
    }
}
