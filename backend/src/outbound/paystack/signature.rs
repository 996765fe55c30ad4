//! HMAC-SHA512 webhook signatures.
//!
//! Paystack signs the raw request body with the account secret key and sends
//! the lowercase hex digest in `x-paystack-signature`.

use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Constant-time check of `signature_hex` against the body digest.
pub fn verify(secret: &[u8], payload: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Lowercase hex digest of `payload`, as Paystack would send it.
pub fn sign(secret: &[u8], payload: &[u8]) -> Option<String> {
    let mut mac = HmacSha512::new_from_slice(secret).ok()?;
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}
