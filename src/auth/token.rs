//! Signed, time-limited bearer tokens (JWT, HS256).
//!
//! Tokens carry `{username, fname, userId, exp}`. Issuance and verification
//! live in the same process and share one symmetric key, injected at
//! construction.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Default token lifetime: one hour.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 3600;

/// The only algorithm tokens are signed or accepted with.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Identity facts embedded in a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub username: String,
    #[serde(rename = "fname")]
    pub first_name: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Identity claims plus the expiry stamped at issue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedClaims {
    #[serde(flatten)]
    pub identity: IdentityClaims,
    /// Expiry, Unix seconds. Fractional values from other issuers are
    /// floored.
    #[serde(deserialize_with = "numeric_date")]
    pub exp: i64,
}

fn numeric_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumericDate {
        Int(i64),
        Float(f64),
    }

    match NumericDate::deserialize(deserializer)? {
        NumericDate::Int(secs) => Ok(secs),
        NumericDate::Float(secs) if secs.is_finite() => Ok(secs.floor() as i64),
        NumericDate::Float(_) => Err(D::Error::custom("exp is not a finite number")),
    }
}

/// Why a presented token was rejected. Callers of [`TokenService::decode`]
/// only ever see `None`; this exists for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeFailure {
    #[error("expired")]
    Expired,
    #[error("bad signature")]
    BadSignature,
    #[error("malformed")]
    Malformed,
}

/// Issues and verifies bearer tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &TOKEN_ALGORITHM)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Sign `claims` with an expiry of now + TTL.
    pub fn issue(&self, claims: IdentityClaims) -> anyhow::Result<String> {
        let exp = i64::try_from(self.ttl_secs)
            .ok()
            .and_then(|ttl| Utc::now().timestamp().checked_add(ttl))
            .ok_or_else(|| anyhow::anyhow!("token TTL {}s overflows expiry", self.ttl_secs))?;
        self.sign(&SignedClaims {
            identity: claims,
            exp,
        })
    }

    fn sign(&self, claims: &SignedClaims) -> anyhow::Result<String> {
        encode(&Header::new(TOKEN_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("JWT encoding failed: {e}"))
    }

    /// Verify signature, algorithm and expiry, keeping the failure reason.
    pub fn verify(&self, token: &str) -> Result<SignedClaims, DecodeFailure> {
        let data = decode::<SignedClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => DecodeFailure::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    DecodeFailure::BadSignature
                }
                _ => DecodeFailure::Malformed,
            },
        )?;

        // The library accepts exp == now; a token is only live while exp > now.
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(DecodeFailure::Expired);
        }
        Ok(data.claims)
    }

    /// Verified claims, or `None` for any failure.
    pub fn decode(&self, token: &str) -> Option<SignedClaims> {
        match self.verify(token) {
            Ok(claims) => Some(claims),
            Err(reason) => {
                tracing::debug!(%reason, token = %fingerprint(token), "Bearer token rejected");
                None
            }
        }
    }
}

/// Short SHA-256 prefix identifying a token in logs without revealing it.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    const KEY: &[u8] = b"test-signing-key-0123456789abcdef";

    fn service() -> TokenService {
        TokenService::new(KEY, DEFAULT_TOKEN_TTL_SECS)
    }

    fn claims() -> IdentityClaims {
        IdentityClaims {
            username: "rajesh123".into(),
            first_name: "Rajesh".into(),
            user_id: "741a35bd-b2d1-4652-9d0a-576ee3c238f2".into(),
        }
    }

    fn b64() -> base64::engine::GeneralPurpose {
        base64::engine::general_purpose::URL_SAFE_NO_PAD
    }

    #[test]
    fn issue_then_decode_returns_same_identity() {
        let svc = service();
        let before = Utc::now().timestamp();
        let token = svc.issue(claims()).unwrap();

        let decoded = svc.decode(&token).unwrap();
        assert_eq!(decoded.identity, claims());
        assert!(decoded.exp >= before + 3600);
        assert!(decoded.exp <= Utc::now().timestamp() + 3600);
    }

    #[test]
    fn token_is_compact_and_url_safe() {
        let token = service().issue(claims()).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));
    }

    #[test]
    fn payload_uses_wire_claim_names() {
        let token = service().issue(claims()).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&b64().decode(payload).unwrap()).unwrap();

        assert_eq!(json["username"], "rajesh123");
        assert_eq!(json["fname"], "Rajesh");
        assert_eq!(json["userId"], "741a35bd-b2d1-4652-9d0a-576ee3c238f2");
        assert!(json["exp"].is_i64());
    }

    #[test]
    fn forged_payload_fails_signature() {
        let svc = service();
        let token = svc.issue(claims()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut json: serde_json::Value =
            serde_json::from_slice(&b64().decode(parts[1]).unwrap()).unwrap();
        json["username"] = serde_json::json!("admin1");
        let forged_payload = b64().encode(serde_json::to_vec(&json).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(svc.verify(&forged), Err(DecodeFailure::BadSignature));
        assert!(svc.decode(&forged).is_none());
    }

    #[test]
    fn single_character_change_fails() {
        let svc = service();
        let token = svc.issue(claims()).unwrap();
        let payload_start = token.find('.').unwrap() + 1;
        let idx = payload_start + 5;

        let mut bytes = token.into_bytes();
        bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert!(svc.decode(&tampered).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service();
        let token = svc
            .sign(&SignedClaims {
                identity: claims(),
                exp: Utc::now().timestamp() - 5,
            })
            .unwrap();

        assert_eq!(svc.verify(&token), Err(DecodeFailure::Expired));
        assert!(svc.decode(&token).is_none());
    }

    #[test]
    fn other_key_is_rejected() {
        let token = service().issue(claims()).unwrap();
        let other = TokenService::new(b"a-completely-different-key", DEFAULT_TOKEN_TTL_SECS);
        assert_eq!(other.verify(&token), Err(DecodeFailure::BadSignature));
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let signed = SignedClaims {
            identity: claims(),
            exp: Utc::now().timestamp() + 600,
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &signed,
            &EncodingKey::from_secret(KEY),
        )
        .unwrap();

        assert_eq!(service().verify(&token), Err(DecodeFailure::BadSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let svc = service();
        assert_eq!(svc.verify(""), Err(DecodeFailure::Malformed));
        assert_eq!(svc.verify("not-a-token"), Err(DecodeFailure::Malformed));
        assert_eq!(svc.verify("a.b.c"), Err(DecodeFailure::Malformed));
    }

    #[test]
    fn missing_identity_claim_is_malformed() {
        let svc = service();
        let token = encode(
            &Header::new(TOKEN_ALGORITHM),
            &serde_json::json!({"username": "someone", "exp": Utc::now().timestamp() + 600}),
            &EncodingKey::from_secret(KEY),
        )
        .unwrap();
        assert_eq!(svc.verify(&token), Err(DecodeFailure::Malformed));
    }

    #[test]
    fn fractional_expiry_is_accepted() {
        let svc = service();
        let exp = Utc::now().timestamp() as f64 + 600.75;
        let token = encode(
            &Header::new(TOKEN_ALGORITHM),
            &serde_json::json!({
                "username": "rajesh123",
                "fname": "Rajesh",
                "userId": "741a35bd-b2d1-4652-9d0a-576ee3c238f2",
                "exp": exp,
            }),
            &EncodingKey::from_secret(KEY),
        )
        .unwrap();

        let decoded = svc.verify(&token).unwrap();
        assert_eq!(decoded.identity, claims());
        assert_eq!(decoded.exp, exp.floor() as i64);
    }

    #[test]
    fn fractional_expiry_in_the_past_is_expired() {
        let token = encode(
            &Header::new(TOKEN_ALGORITHM),
            &serde_json::json!({
                "username": "rajesh123",
                "fname": "Rajesh",
                "userId": "741a35bd-b2d1-4652-9d0a-576ee3c238f2",
                "exp": Utc::now().timestamp() as f64 - 30.5,
            }),
            &EncodingKey::from_secret(KEY),
        )
        .unwrap();
        assert_eq!(service().verify(&token), Err(DecodeFailure::Expired));
    }

    #[test]
    fn longest_allowed_ttl_issues_live_tokens() {
        let svc = TokenService::new(KEY, MAX_TOKEN_TTL_SECS);
        let token = svc.issue(claims()).unwrap();
        let decoded = svc.verify(&token).unwrap();
        assert!(decoded.exp > Utc::now().timestamp() + MAX_TOKEN_TTL_SECS as i64 - 60);
    }

    #[test]
    fn overflowing_ttl_fails_to_issue() {
        assert!(TokenService::new(KEY, u64::MAX).issue(claims()).is_err());
        assert!(TokenService::new(KEY, i64::MAX as u64).issue(claims()).is_err());
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
        assert_eq!(fingerprint("abc").len(), 12);
    }
}
