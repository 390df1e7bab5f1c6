//! API keys for programmatic quote ingestion.
//!
//! A key looks like `sk_<64 hex chars>`. Only a bcrypt hash and an 8-character
//! lookup prefix (the first 8 hex characters after `sk_`) are stored; the raw
//! key is returned once, at creation.
//!
//! Verification narrows candidates by prefix, bcrypt-compares each, and only
//! then looks at the revoked flag. A revoked key therefore reports
//! [`KeyMatch::Revoked`] rather than [`KeyMatch::NoMatch`].

use rand::RngCore;
use rand::rngs::OsRng;

/// Literal prefix every key starts with.
pub const API_KEY_PREFIX: &str = "sk_";

/// Number of hex characters stored in clear for lookup.
pub const KEY_PREFIX_LEN: usize = 8;

/// Random bytes behind each key.
const SECRET_BYTES: usize = 32;

/// Errors from API key handling.
#[derive(Debug, thiserror::Error)]
pub enum ApiKeyError {
    /// The presented value is not shaped like an API key.
    #[error("malformed API key")]
    Malformed,

    /// bcrypt failed while hashing.
    #[error("failed to hash API key: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// A freshly minted key.
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// The full key, `sk_...`. Show it once and drop it.
    pub raw: String,
    /// Lookup prefix stored next to the hash.
    pub prefix: String,
    /// bcrypt hash of `raw`.
    pub hash: String,
}

/// A persisted key as seen by the matcher.
pub trait StoredApiKey {
    fn hashed_key(&self) -> &str;
    fn is_revoked(&self) -> bool;
}

/// Outcome of matching a presented key against stored candidates.
#[derive(Debug)]
pub enum KeyMatch<'a, K> {
    /// The key matched an active row.
    Active(&'a K),
    /// The key matched a row that has been revoked.
    Revoked(&'a K),
    /// No candidate hash matched.
    NoMatch,
}

/// Generate a key hashed with the default bcrypt cost.
pub fn generate_api_key() -> Result<GeneratedApiKey, ApiKeyError> {
    generate_api_key_with_cost(bcrypt::DEFAULT_COST)
}

/// Generate a key hashed with an explicit bcrypt cost.
pub fn generate_api_key_with_cost(cost: u32) -> Result<GeneratedApiKey, ApiKeyError> {
    let mut secret = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut secret);

    let raw = format!("{}{}", API_KEY_PREFIX, hex::encode(secret));
    let prefix = key_prefix(&raw)?.to_string();
    let hash = bcrypt::hash(&raw, cost)?;

    Ok(GeneratedApiKey { raw, prefix, hash })
}

/// Extract the lookup prefix, validating the key's shape.
pub fn key_prefix(raw: &str) -> Result<&str, ApiKeyError> {
    let body = raw.strip_prefix(API_KEY_PREFIX).ok_or(ApiKeyError::Malformed)?;

    if body.len() < KEY_PREFIX_LEN || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ApiKeyError::Malformed);
    }

    Ok(&body[..KEY_PREFIX_LEN])
}

/// Compare a raw key against a bcrypt hash. Unparseable hashes never match.
pub fn verify_api_key(raw: &str, hash: &str) -> bool {
    bcrypt::verify(raw, hash).unwrap_or(false)
}

/// Find the candidate whose hash matches `raw`.
pub fn match_api_key<'a, K: StoredApiKey>(raw: &str, candidates: &'a [K]) -> KeyMatch<'a, K> {
    for candidate in candidates {
        if verify_api_key(raw, candidate.hashed_key()) {
            return if candidate.is_revoked() {
                KeyMatch::Revoked(candidate)
            } else {
                KeyMatch::Active(candidate)
            };
        }
    }
    KeyMatch::NoMatch
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    struct Row {
        hash: String,
        revoked: bool,
    }

    impl StoredApiKey for Row {
        fn hashed_key(&self) -> &str {
            &self.hash
        }

        fn is_revoked(&self) -> bool {
            self.revoked
        }
    }

    #[test]
    fn test_generated_key_shape() {
        let key = generate_api_key_with_cost(TEST_COST).unwrap();
        assert!(key.raw.starts_with("sk_"));
        assert_eq!(key.raw.len(), 3 + 64);
        assert_eq!(key.prefix.len(), KEY_PREFIX_LEN);
        assert_eq!(&key.raw[3..11], key.prefix);
        assert!(verify_api_key(&key.raw, &key.hash));
    }

    #[test]
    fn test_key_prefix_rejects_garbage() {
        assert!(key_prefix("Bearer nope").is_err());
        assert!(key_prefix("sk_").is_err());
        assert!(key_prefix("sk_1234").is_err());
        assert!(key_prefix("sk_zzzzzzzzzzzz").is_err());
        assert!(key_prefix("pk_0123456789abcdef").is_err());
        assert_eq!(key_prefix("sk_0123456789abcdef").unwrap(), "01234567");
    }

    #[test]
    fn test_match_active_key() {
        let key = generate_api_key_with_cost(TEST_COST).unwrap();
        let rows = vec![Row {
            hash: key.hash.clone(),
            revoked: false,
        }];
        assert!(matches!(match_api_key(&key.raw, &rows), KeyMatch::Active(_)));
    }

    #[test]
    fn test_revoked_key_reports_revoked_even_though_hash_matches() {
        let key = generate_api_key_with_cost(TEST_COST).unwrap();
        let rows = vec![Row {
            hash: key.hash.clone(),
            revoked: true,
        }];
        assert!(matches!(match_api_key(&key.raw, &rows), KeyMatch::Revoked(_)));
    }

    #[test]
    fn test_unrelated_key_does_not_match() {
        let stored = generate_api_key_with_cost(TEST_COST).unwrap();
        let presented = generate_api_key_with_cost(TEST_COST).unwrap();
        let rows = vec![Row {
            hash: stored.hash,
            revoked: false,
        }];
        assert!(matches!(
            match_api_key(&presented.raw, &rows),
            KeyMatch::NoMatch
        ));
    }

    #[test]
    fn test_match_skips_to_correct_candidate() {
        let a = generate_api_key_with_cost(TEST_COST).unwrap();
        let b = generate_api_key_with_cost(TEST_COST).unwrap();
        let rows = vec![
            Row {
                hash: a.hash.clone(),
                revoked: true,
            },
            Row {
                hash: b.hash.clone(),
                revoked: false,
            },
        ];
        match match_api_key(&b.raw, &rows) {
            KeyMatch::Active(row) => assert_eq!(row.hash, b.hash),
            _ => panic!("expected an active match"),
        }
    }

    #[test]
    fn test_corrupt_hash_never_matches() {
        assert!(!verify_api_key("sk_00000000", "not-a-bcrypt-hash"));
    }
}
