//! Webhook signature verification.
//!
//! Providers sign the webhook body with `HMAC-SHA256(secret, canonical_json)`,
//! where `canonical_json` is the payload with `sandbox_id` removed,
//! object keys sorted, and the tightest possible separators — this has
//! to be bit-exact with the external signer, so the canonicalization
//! lives next to the verification that depends on it rather than in a
//! generic JSON helper.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Serializes `payload` with `sandbox_id` removed, keys sorted
/// lexicographically, and no whitespace — `,` between members, `:`
/// between key and value. Non-object payloads are serialized as-is
/// (there is nothing to strip or sort).
pub fn canonicalize(payload: &Value) -> String {
    let Value::Object(map) = payload else {
        return payload.to_string();
    };

    let mut sorted: std::collections::BTreeMap<&String, &Value> = std::collections::BTreeMap::new();
    for (k, v) in map {
        if k != "sandbox_id" {
            sorted.insert(k, v);
        }
    }

    let mut out = String::from("{");
    for (i, (k, v)) in sorted.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&serde_json::to_string(k).expect("string keys always serialize"));
        out.push(':');
        out.push_str(&v.to_string());
    }
    out.push('}');
    out
}

/// Computes `sha256=<hex>` over the canonical form of `payload`.
pub fn compute_signature(secret: &[u8], payload: &Value) -> String {
    let canonical = canonicalize(payload);
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(canonical.as_bytes());
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Verifies the `X-Webhook-Signature` header against `payload`, in
/// constant time. Always computes the expected signature before
/// comparing, so a malformed header takes the same code path as a
/// mismatched one.
pub fn verify_signature(secret: &[u8], payload: &Value, header: &str) -> bool {
    let expected = compute_signature(secret, payload);
    let expected = expected.as_bytes();
    let actual = header.as_bytes();
    expected.len() == actual.len() && expected.ct_eq(actual).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonicalize_sorts_keys_strips_sandbox_id_and_uses_tight_separators() {
        let payload = json!({
            "event_type": "payment.created",
            "sandbox_id": "sbx_123",
            "amount": "100.00",
        });
        assert_eq!(
            canonicalize(&payload),
            r#"{"amount":"100.00","event_type":"payment.created"}"#
        );
    }

    #[test]
    fn roundtrip_verifies() {
        let payload = json!({"a": 1, "sandbox_id": "ignored"});
        let sig = compute_signature(b"secret", &payload);
        assert!(sig.starts_with(SIGNATURE_PREFIX));
        assert!(verify_signature(b"secret", &payload, &sig));
    }

    #[test]
    fn wrong_secret_fails() {
        let payload = json!({"a": 1});
        let sig = compute_signature(b"secret-1", &payload);
        assert!(!verify_signature(b"secret-2", &payload, &sig));
    }

    #[test]
    fn tampered_sandbox_id_does_not_affect_signature() {
        let p1 = json!({"a": 1, "sandbox_id": "one"});
        let p2 = json!({"a": 1, "sandbox_id": "two"});
        assert_eq!(
            compute_signature(b"secret", &p1),
            compute_signature(b"secret", &p2)
        );
    }

    #[test]
    fn tampered_field_fails() {
        let payload = json!({"a": 1});
        let sig = compute_signature(b"secret", &payload);
        let tampered = json!({"a": 2});
        assert!(!verify_signature(b"secret", &tampered, &sig));
    }
}
