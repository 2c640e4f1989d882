use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the lower-case hex HMAC-SHA256 of `payload` keyed by `secret`.
///
/// This is the value SahelPay sends in the `X-SahelPay-Signature` header.
pub fn compute_signature(payload: impl AsRef<[u8]>, secret: impl AsRef<[u8]>) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_ref()).expect("HMAC accepts any key length");
    mac.update(payload.as_ref());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a webhook signature against the raw request body.
///
/// Returns `false` on any mismatch, including a signature of the wrong
/// length or one that is not hex at all. The comparison is constant-time.
pub fn verify_signature(
    payload: impl AsRef<[u8]>,
    signature: &str,
    secret: impl AsRef<[u8]>,
) -> bool {
    let expected = compute_signature(payload, secret);
    signatures_match(&expected, signature)
}

/// Compare two hex signatures without leaking where, or whether by length,
/// they differ: both sides are hashed to SHA-256 digests first.
fn signatures_match(expected: &str, received: &str) -> bool {
    let expected = Sha256::digest(expected.as_bytes());
    let received = Sha256::digest(received.as_bytes());
    expected.ct_eq(&received).into()
}
