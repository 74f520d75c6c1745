//! HMAC-SHA256 token signatures
//!
//! The queue service signs the token payload with the customer's secret key
//! and appends the lowercase hex digest as the hash group. The service does
//! not guarantee the hex casing, so digests are compared after lowercasing,
//! in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::token::HASH_KEY;
use crate::domain::{DomainError, TokenSyntax, UnsignedToken};

type HmacSha256 = Hmac<Sha256>;

/// Lowercase hex HMAC-SHA256 of `payload`
pub fn compute_hash(payload: &str, secret_key: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Check `hash_code` against the digest of `payload`, ignoring hex case
pub fn verify_hash(payload: &str, hash_code: &str, secret_key: &str) -> bool {
    let computed = compute_hash(payload, secret_key);
    let supplied = hash_code.to_ascii_lowercase();
    computed.as_bytes().ct_eq(supplied.as_bytes()).into()
}

/// Build a signed token (local testing; the queue service issues real ones)
pub fn sign_token(
    token: &UnsignedToken,
    syntax: TokenSyntax,
    secret_key: &str,
) -> Result<String, DomainError> {
    token.validate(syntax)?;

    let payload = token.payload(syntax);
    let hash = compute_hash(&payload, secret_key);
    Ok(format!(
        "{}{}{}{}{}",
        payload, syntax.group, HASH_KEY, syntax.pair, hash
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QueueUrlParams;

    #[test]
    fn test_compute_hash_known_vector() {
        // RFC 4231 test case 2
        let hash = compute_hash("what do ya want for nothing?", "Jefe");
        assert_eq!(
            hash,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify_ignores_case() {
        let hash = compute_hash("e_evt1~q_q1~ts_1~ce_false", "secret");
        assert!(verify_hash("e_evt1~q_q1~ts_1~ce_false", &hash, "secret"));
        assert!(verify_hash(
            "e_evt1~q_q1~ts_1~ce_false",
            &hash.to_ascii_uppercase(),
            "secret"
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_key_and_payload() {
        let hash = compute_hash("payload", "secret");
        assert!(!verify_hash("payload", &hash, "other-secret"));
        assert!(!verify_hash("payload2", &hash, "secret"));
        assert!(!verify_hash("payload", "", "secret"));
        assert!(!verify_hash("payload", &hash[..10], "secret"));
    }

    #[test]
    fn test_signed_token_verifies() {
        let unsigned = UnsignedToken::new("evt1", "q123", 1700003600).with_extendable_cookie(true);
        let token = sign_token(&unsigned, TokenSyntax::NATIVE, "secret").unwrap();

        let params = QueueUrlParams::parse(&token).unwrap();
        assert!(verify_hash(
            &params.queue_it_token_without_hash,
            &params.hash_code,
            "secret"
        ));
        assert_eq!(params.queue_id, "q123");
        assert!(params.extendable_cookie);
    }

    #[test]
    fn test_sign_rejects_delimiter_in_ids() {
        let unsigned = UnsignedToken::new("evt&1", "q123", 1);
        assert!(sign_token(&unsigned, TokenSyntax::QUERY, "secret").is_err());
    }

    #[test]
    fn test_signed_tokens_always_parse_back() {
        let ids = ["evt~1", "q|1", "a&b", "x=y", "x_y", "plain"];

        for syntax in [TokenSyntax::NATIVE, TokenSyntax::PIPE, TokenSyntax::QUERY] {
            for id in ids {
                let unsigned = UnsignedToken::new(id, id, 1700003600);
                let Ok(token) = sign_token(&unsigned, syntax, "secret") else {
                    continue;
                };

                let params = QueueUrlParams::parse(&token)
                    .unwrap_or_else(|e| panic!("{:?} token {} did not parse: {}", syntax, token, e));
                assert_eq!(params.event_id, id);
                assert_eq!(params.queue_id, id);
                assert!(verify_hash(
                    &params.queue_it_token_without_hash,
                    &params.hash_code,
                    "secret"
                ));
            }
        }

        let tilde = UnsignedToken::new("evt~1", "q1", 1);
        assert!(sign_token(&tilde, TokenSyntax::QUERY, "secret").is_err());
    }
}
