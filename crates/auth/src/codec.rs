//! Compact signed token codec.
//!
//! Wire format: `base64url(header) "." base64url(payload) "." base64url(signature)`,
//! unpadded, where the signature covers the first two encoded segments.
//!
//! Decoding order matters: the header is checked, then the signature, and
//! only then is the payload parsed. Nothing attacker-controlled inside the
//! payload is looked at before the signature has been verified.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;

use crate::keys::{Algorithm, TokenKey};
use crate::{AuthError, ClaimSet};

/// Token type named in every header.
pub const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Deserialize)]
struct Header {
    typ: String,
    alg: String,
}

/// A token whose signature and structure have been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub claims: ClaimSet,
    /// Decoded payload JSON exactly as signed.
    pub raw_claims: Vec<u8>,
}

/// Encodes claim sets into signed tokens and verifies them back.
///
/// Holds the process-wide key; construct once at startup and share behind an `Arc`.
#[derive(Debug)]
pub struct TokenCodec {
    key: TokenKey,
    header_segment: String,
}

impl TokenCodec {
    pub fn new(key: TokenKey) -> Self {
        let header_json = format!(
            r#"{{"typ":"{TOKEN_TYPE}","alg":"{}"}}"#,
            key.algorithm().as_str()
        );
        Self {
            key,
            header_segment: URL_SAFE_NO_PAD.encode(header_json),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.key.algorithm()
    }

    pub fn key(&self) -> &TokenKey {
        &self.key
    }

    /// Serialize and sign. Deterministic for identical claims and key.
    pub fn encode(&self, claims: &ClaimSet) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(claims)
            .map_err(|e| AuthError::internal(format!("claim serialization failed: {e}")))?;

        let mut token = String::with_capacity(self.header_segment.len() + payload.len() * 2);
        token.push_str(&self.header_segment);
        token.push('.');
        URL_SAFE_NO_PAD.encode_string(&payload, &mut token);

        let signature = self
            .key
            .sign(token.as_bytes())
            .map_err(|e| AuthError::internal(e.to_string()))?;

        token.push('.');
        URL_SAFE_NO_PAD.encode_string(signature, &mut token);
        Ok(token)
    }

    /// Verify and decode a token into its claim set.
    pub fn decode(&self, token: &str) -> Result<ClaimSet, AuthError> {
        self.decode_verified(token).map(|verified| verified.claims)
    }

    /// Verify and decode, keeping the raw payload bytes for per-route checks.
    pub fn decode_verified(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::MalformedToken);
        };

        self.check_header(header_b64)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::InvalidSignature)?;
        let signed_len = header_b64.len() + 1 + payload_b64.len();
        if !self.key.verify(&token.as_bytes()[..signed_len], &signature) {
            return Err(AuthError::InvalidSignature);
        }

        let raw_claims = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| AuthError::decoding(format!("payload is not base64url: {e}")))?;
        let claims: ClaimSet = serde_json::from_slice(&raw_claims)
            .map_err(|e| AuthError::decoding(e.to_string()))?;
        claims.check_integrity()?;

        Ok(VerifiedToken { claims, raw_claims })
    }

    fn check_header(&self, header_b64: &str) -> Result<(), AuthError> {
        let header_json = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| AuthError::MalformedToken)?;
        let header: Header =
            serde_json::from_slice(&header_json).map_err(|_| AuthError::MalformedToken)?;
        if header.typ != TOKEN_TYPE || header.alg != self.key.algorithm().as_str() {
            return Err(AuthError::MalformedToken);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Role, TOKEN_TTL_SECS, UserRecord};
    use genusdb_core::{Genus, Subject};
    use proptest::prelude::*;
    use uuid::Uuid;

    const SECRET: &[u8] = b"test-secret-test-secret-test-secret!";
    const NOW: i64 = 1_700_000_000;

    fn hmac_codec() -> TokenCodec {
        TokenCodec::new(TokenKey::hmac(SECRET.to_vec()).unwrap())
    }

    fn alice() -> UserRecord {
        UserRecord::new(1, "Alice", Role::Writer, Genus::new("hymenobacter").unwrap())
    }

    fn claims() -> ClaimSet {
        ClaimSet::issue_with_id(&alice(), NOW, "https://app.example", Uuid::nil())
    }

    fn segments(token: &str) -> Vec<String> {
        token.split('.').map(str::to_string).collect()
    }

    #[test]
    fn header_is_fixed_json() {
        let token = hmac_codec().encode(&claims()).unwrap();
        let header = URL_SAFE_NO_PAD.decode(&segments(&token)[0]).unwrap();
        assert_eq!(header, br#"{"typ":"JWT","alg":"HS256"}"#);
    }

    #[test]
    fn encode_is_deterministic() {
        let codec = hmac_codec();
        assert_eq!(codec.encode(&claims()).unwrap(), codec.encode(&claims()).unwrap());
        let other = TokenCodec::new(TokenKey::hmac(SECRET.to_vec()).unwrap());
        assert_eq!(codec.encode(&claims()).unwrap(), other.encode(&claims()).unwrap());
    }

    #[test]
    fn token_has_three_unpadded_segments() {
        let token = hmac_codec().encode(&claims()).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));
        assert!(!token.contains(char::is_whitespace));
    }

    #[test]
    fn decode_returns_raw_payload() {
        let codec = hmac_codec();
        let token = codec.encode(&claims()).unwrap();
        let verified = codec.decode_verified(&token).unwrap();
        assert_eq!(verified.claims, claims());
        let value: serde_json::Value = serde_json::from_slice(&verified.raw_claims).unwrap();
        assert_eq!(value["sub"], 1);
        assert_eq!(value["role"], "W");
        assert_eq!(value["genus"], "hymenobacter");
        assert_eq!(value["exp"].as_i64().unwrap() - value["iat"].as_i64().unwrap(), TOKEN_TTL_SECS);
    }

    #[test]
    fn wrong_part_count_is_malformed() {
        let codec = hmac_codec();
        assert_eq!(codec.decode("a.b"), Err(AuthError::MalformedToken));
        assert_eq!(codec.decode("a.b.c.d"), Err(AuthError::MalformedToken));
        assert_eq!(codec.decode(""), Err(AuthError::MalformedToken));
    }

    #[test]
    fn bad_header_is_malformed() {
        let codec = hmac_codec();
        let token = codec.encode(&claims()).unwrap();
        let parts = segments(&token);

        let none_alg = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT","alg":"none"}"#);
        let forged = format!("{none_alg}.{}.{}", parts[1], parts[2]);
        assert_eq!(codec.decode(&forged), Err(AuthError::MalformedToken));

        let garbage = format!("!!!.{}.{}", parts[1], parts[2]);
        assert_eq!(codec.decode(&garbage), Err(AuthError::MalformedToken));
    }

    #[test]
    fn algorithm_confusion_is_rejected() {
        let ed = TokenCodec::new(TokenKey::ed25519_from_seed(&[3u8; 32]).unwrap());
        let token = ed.encode(&claims()).unwrap();
        assert_eq!(hmac_codec().decode(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn token_from_another_secret_has_invalid_signature() {
        let other = TokenCodec::new(TokenKey::hmac(b"another-secret-another-secret-000".to_vec()).unwrap());
        let token = other.encode(&claims()).unwrap();
        assert_eq!(hmac_codec().decode(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn tampered_payload_has_invalid_signature() {
        let codec = hmac_codec();
        let token = codec.encode(&claims()).unwrap();
        let parts = segments(&token);

        let mut value: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&parts[1]).unwrap()).unwrap();
        value["role"] = serde_json::Value::String("A".into());
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&value).unwrap());
        let forged = format!("{}.{payload}.{}", parts[0], parts[2]);

        assert_eq!(codec.decode(&forged), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn signed_garbage_payload_is_a_decoding_error() {
        let codec = hmac_codec();
        let unsigned = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT","alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(b"{\"sub\":1}")
        );
        let sig = codec.key.sign(unsigned.as_bytes()).unwrap();
        let token = format!("{unsigned}.{}", URL_SAFE_NO_PAD.encode(sig));

        assert!(matches!(codec.decode(&token), Err(AuthError::Decoding(_))));
    }

    #[test]
    fn ed25519_codec_round_trips_and_verify_only_peer_accepts() {
        let signer = TokenCodec::new(TokenKey::ed25519_from_seed(&[5u8; 32]).unwrap());
        let public = signer.key().public_key().unwrap();
        let verifier = TokenCodec::new(TokenKey::ed25519_verify_only(&public).unwrap());

        let token = signer.encode(&claims()).unwrap();
        assert_eq!(verifier.decode(&token).unwrap(), claims());
        assert!(matches!(verifier.encode(&claims()), Err(AuthError::Internal(_))));
    }

    fn arb_claims() -> impl Strategy<Value = ClaimSet> {
        let subject = prop_oneof![
            any::<i64>().prop_map(Subject::Id),
            "[a-z][a-z0-9-]{0,15}".prop_map(Subject::Name),
        ];
        let role = prop_oneof![Just(Role::Admin), Just(Role::Writer), Just(Role::Reader)];
        (
            subject,
            ".{0,24}",
            role,
            "[a-z][a-z0-9-]{0,20}",
            0i64..4_000_000_000,
            ".{0,40}",
            any::<u128>(),
        )
            .prop_map(|(subject, name, role, genus, iat, origin, id)| {
                let user = UserRecord {
                    subject,
                    display_name: name,
                    role,
                    genus: Genus::new(genus).unwrap(),
                };
                ClaimSet::issue_with_id(&user, iat, origin, Uuid::from_u128(id))
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: decoding an encoded claim set yields the same claim set.
        #[test]
        fn decode_inverts_encode(claims in arb_claims()) {
            let codec = hmac_codec();
            let token = codec.encode(&claims).unwrap();
            prop_assert_eq!(codec.decode(&token).unwrap(), claims);
        }

        /// Property: flipping any single signature bit is always detected.
        #[test]
        fn any_signature_bit_flip_is_detected(claims in arb_claims(), bit in 0usize..256) {
            let codec = hmac_codec();
            let token = codec.encode(&claims).unwrap();
            let parts = segments(&token);

            let mut sig = URL_SAFE_NO_PAD.decode(&parts[2]).unwrap();
            sig[bit / 8] ^= 1 << (bit % 8);
            let tampered = format!("{}.{}.{}", parts[0], parts[1], URL_SAFE_NO_PAD.encode(sig));

            prop_assert_eq!(codec.decode(&tampered), Err(AuthError::InvalidSignature));
        }

        /// Property: the same holds for Ed25519 signatures.
        #[test]
        fn any_ed25519_signature_bit_flip_is_detected(claims in arb_claims(), bit in 0usize..512) {
            let codec = TokenCodec::new(TokenKey::ed25519_from_seed(&[11u8; 32]).unwrap());
            let token = codec.encode(&claims).unwrap();
            let parts = segments(&token);

            let mut sig = URL_SAFE_NO_PAD.decode(&parts[2]).unwrap();
            sig[bit / 8] ^= 1 << (bit % 8);
            let tampered = format!("{}.{}.{}", parts[0], parts[1], URL_SAFE_NO_PAD.encode(sig));

            prop_assert_eq!(codec.decode(&tampered), Err(AuthError::InvalidSignature));
        }
    }
}
