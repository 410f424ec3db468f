use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes behind each secret. 256 bits, comfortably above
/// the minimum needed to make guessing infeasible.
const SECRET_BYTES: usize = 32;

/// Generates a fresh opaque secret for embedding in a modification link.
/// The caller hands the plaintext to the client and stores only the digest.
pub fn issue_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// One-way digest of a secret. Deterministic, so the stored digest can be
/// matched by equality lookup; there is no inverse operation.
pub fn digest(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_has_enough_entropy() {
        let secret = issue_secret();
        // 32 bytes base64url without padding is 43 characters
        assert_eq!(secret.len(), 43);
    }

    #[test]
    fn test_secrets_are_unique() {
        let a = issue_secret();
        let b = issue_secret();
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_is_deterministic() {
        let secret = issue_secret();
        assert_eq!(digest(&secret), digest(&secret));
    }

    #[test]
    fn test_distinct_secrets_distinct_digests() {
        assert_ne!(digest("secret-a"), digest("secret-b"));
    }

    #[test]
    fn test_digest_is_sha256_hex() {
        // 256-bit digest, hex encoded
        assert_eq!(digest("anything").len(), 64);
        // known vector for the empty string
        assert_eq!(
            digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
