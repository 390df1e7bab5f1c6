//! HMAC-SHA256 helpers.
//!
//! Used for the signed OAuth state cookie and for provider webhook
//! signatures. All comparisons are constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length
    HmacSha256::new_from_slice(secret).unwrap_or_else(|_| unreachable!())
}

/// Hex-encoded HMAC-SHA256 of `body`.
pub fn hmac_sha256_hex(secret: &[u8], body: &[u8]) -> String {
    let mut m = mac(secret);
    m.update(body);
    hex::encode(m.finalize().into_bytes())
}

/// Verify a hex HMAC-SHA256 signature, optionally prefixed with `sha256=`.
pub fn verify_hmac_sha256_hex(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let signature = signature.trim();
    let hex_sig = signature.strip_prefix("sha256=").unwrap_or(signature);

    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };

    let mut m = mac(secret);
    m.update(body);
    m.verify_slice(&expected).is_ok()
}

/// Produce `value.signature` for storage in a cookie.
pub fn sign_value(secret: &[u8], value: &str) -> String {
    format!("{}.{}", value, hmac_sha256_hex(secret, value.as_bytes()))
}

/// Return the original value if `signed` carries a valid signature.
pub fn verify_signed_value<'a>(secret: &[u8], signed: &'a str) -> Option<&'a str> {
    let (value, signature) = signed.rsplit_once('.')?;
    verify_hmac_sha256_hex(secret, value.as_bytes(), signature).then_some(value)
}

/// Constant-time string equality.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"cookie-secret";

    #[test]
    fn test_sign_and_verify_value() {
        let signed = sign_value(SECRET, "abc123");
        assert!(signed.starts_with("abc123."));
        assert_eq!(verify_signed_value(SECRET, &signed), Some("abc123"));
    }

    #[test]
    fn test_tampered_value_rejected() {
        let signed = sign_value(SECRET, "abc123");
        let tampered = signed.replacen("abc123", "abc124", 1);
        assert_eq!(verify_signed_value(SECRET, &tampered), None);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signed = sign_value(SECRET, "abc123");
        assert_eq!(verify_signed_value(b"other", &signed), None);
    }

    #[test]
    fn test_unsigned_value_rejected() {
        assert_eq!(verify_signed_value(SECRET, "abc123"), None);
        assert_eq!(verify_signed_value(SECRET, "abc123.nothex"), None);
        assert_eq!(verify_signed_value(SECRET, ""), None);
    }

    #[test]
    fn test_webhook_signature_with_and_without_prefix() {
        let body = br#"{"user_id":42}"#;
        let sig = hmac_sha256_hex(b"hook", body);
        assert!(verify_hmac_sha256_hex(b"hook", body, &sig));
        assert!(verify_hmac_sha256_hex(
            b"hook",
            body,
            &format!("sha256={}", sig)
        ));
        assert!(!verify_hmac_sha256_hex(b"hook", b"{}", &sig));
        assert!(!verify_hmac_sha256_hex(b"hook", body, "deadbeef"));
        assert!(!verify_hmac_sha256_hex(b"hook", body, "not-hex"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("state", "state"));
        assert!(!constant_time_eq("state", "stale"));
        assert!(!constant_time_eq("state", "state2"));
    }
}
