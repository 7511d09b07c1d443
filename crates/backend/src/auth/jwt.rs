//! JWT token creation and validation.
//!
//! Tokens are RS256-signed. Only the private key can mint a token, the public
//! key is enough to validate one.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use uuid::Uuid;

use super::types::Claims;
use crate::config::AuthSettings;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid key material: {0}")]
    KeyFormat(String),

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("token signature does not verify")]
    Signature,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("token is malformed")]
    Malformed,

    #[error("token is not signed with RS256")]
    AlgorithmMismatch,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            ErrorKind::InvalidSignature => TokenError::Signature,
            ErrorKind::InvalidAlgorithm => TokenError::AlgorithmMismatch,
            _ => TokenError::Malformed,
        }
    }
}

/// One RSA key pair.
#[derive(Clone)]
pub struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, TokenError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| TokenError::KeyFormat(format!("private key: {}", e)))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| TokenError::KeyFormat(format!("public key: {}", e)))?;

        Ok(Self { encoding, decoding })
    }

    /// Keys as they arrive from the environment: base64 of the PEM text.
    pub fn from_base64(private_b64: &str, public_b64: &str) -> Result<Self, TokenError> {
        let private_pem = decode_base64(private_b64, "private key")?;
        let public_pem = decode_base64(public_b64, "public key")?;
        Self::from_pem(&private_pem, &public_pem)
    }
}

fn decode_base64(value: &str, what: &str) -> Result<Vec<u8>, TokenError> {
    STANDARD
        .decode(value.trim())
        .map_err(|e| TokenError::KeyFormat(format!("{} is not valid base64: {}", what, e)))
}

/// Sign a token for `subject` valid for `ttl` from now.
pub fn issue(subject: &str, ttl: Duration, key: &EncodingKey) -> Result<String, TokenError> {
    issue_at(subject, ttl, key, Utc::now())
}

/// Sign a token as if issued at `now`.
pub fn issue_at(
    subject: &str,
    ttl: Duration,
    key: &EncodingKey,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    let ttl = chrono::Duration::from_std(ttl).map_err(|e| TokenError::Signing(e.to_string()))?;
    let expires = now
        .checked_add_signed(ttl)
        .ok_or_else(|| TokenError::Signing("token lifetime out of range".to_string()))?;
    let iat = now.timestamp();

    let claims = Claims {
        sub: subject.to_string(),
        iat,
        nbf: iat,
        exp: expires.timestamp(),
    };

    encode(&Header::new(Algorithm::RS256), &claims, key)
        .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Validate a token and return its subject verbatim.
pub fn validate(token: &str, key: &DecodingKey) -> Result<String, TokenError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = 0;
    validation.validate_nbf = true;
    validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

    let data = decode::<Claims>(token, key, &validation)?;
    Ok(data.claims.sub)
}

/// Access and refresh key pairs with their lifetimes.
#[derive(Clone)]
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(
        access: SigningKeys,
        refresh: SigningKeys,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access,
            refresh,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Result<Self, TokenError> {
        Ok(Self::new(
            SigningKeys::from_base64(&settings.access_private_key, &settings.access_public_key)?,
            SigningKeys::from_base64(&settings.refresh_private_key, &settings.refresh_public_key)?,
            settings.access_ttl,
            settings.refresh_ttl,
        ))
    }

    pub fn issue_access(&self, subject: Uuid) -> Result<String, TokenError> {
        issue(&subject.to_string(), self.access_ttl, &self.access.encoding)
    }

    pub fn issue_refresh(&self, subject: Uuid) -> Result<String, TokenError> {
        issue(&subject.to_string(), self.refresh_ttl, &self.refresh.encoding)
    }

    pub fn validate_access(&self, token: &str) -> Result<String, TokenError> {
        validate(token, &self.access.decoding)
    }

    pub fn validate_refresh(&self, token: &str) -> Result<String, TokenError> {
        validate(token, &self.refresh.decoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        test_tokens, ACCESS_PRIVATE, ACCESS_PUBLIC, FOREIGN_PRIVATE, FOREIGN_PUBLIC,
    };

    fn access_keys() -> SigningKeys {
        SigningKeys::from_pem(ACCESS_PRIVATE.as_bytes(), ACCESS_PUBLIC.as_bytes())
            .expect("fixture keys should load")
    }

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_issue_and_validate() {
        let keys = access_keys();
        let token = issue("subject-1", MINUTE, &keys.encoding).expect("should sign");

        assert_eq!(validate(&token, &keys.decoding).unwrap(), "subject-1");
    }

    #[test]
    fn test_claims_layout() {
        let keys = access_keys();
        let now = Utc::now();
        let token = issue_at("s", MINUTE, &keys.encoding, now).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        let claims = decode::<Claims>(&token, &keys.decoding, &validation)
            .unwrap()
            .claims;
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(claims.exp, claims.iat + 60);
    }

    #[test]
    fn test_expired_token() {
        let keys = access_keys();
        let issued = Utc::now() - chrono::Duration::seconds(120);
        let token = issue_at("s", MINUTE, &keys.encoding, issued).unwrap();

        assert!(matches!(
            validate(&token, &keys.decoding),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_not_yet_valid_token() {
        let keys = access_keys();
        let issued = Utc::now() + chrono::Duration::seconds(120);
        let token = issue_at("s", MINUTE, &keys.encoding, issued).unwrap();

        assert!(matches!(
            validate(&token, &keys.decoding),
            Err(TokenError::NotYetValid)
        ));
    }

    #[test]
    fn test_foreign_key_pair_rejected() {
        let foreign =
            SigningKeys::from_pem(FOREIGN_PRIVATE.as_bytes(), FOREIGN_PUBLIC.as_bytes()).unwrap();
        let token = issue("s", MINUTE, &foreign.encoding).unwrap();

        assert!(matches!(
            validate(&token, &access_keys().decoding),
            Err(TokenError::Signature)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let keys = access_keys();
        let token = issue("s", MINUTE, &keys.encoding).unwrap();

        for index in [0, token.len() / 2, token.len() - 2] {
            let mut bytes = token.clone().into_bytes();
            bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            if tampered == token {
                continue;
            }
            assert!(validate(&tampered, &keys.decoding).is_err());
        }
    }

    #[test]
    fn test_symmetric_token_is_algorithm_mismatch() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "s".to_string(),
            iat: now,
            nbf: now,
            exp: now + 60,
        };
        // HMAC keyed with the public key, the classic algorithm-confusion forgery
        let forged = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(ACCESS_PUBLIC.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            validate(&forged, &access_keys().decoding),
            Err(TokenError::AlgorithmMismatch)
        ));
    }

    #[test]
    fn test_lifetime_past_calendar_range_fails_to_sign() {
        let keys = access_keys();
        let million_years = Duration::from_secs(1_000_000 * 365 * 24 * 60 * 60);

        assert!(matches!(
            issue("subject-1", million_years, &keys.encoding),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            validate("not.a.token", &access_keys().decoding),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn test_bad_key_material() {
        assert!(matches!(
            SigningKeys::from_base64("%%%", "%%%"),
            Err(TokenError::KeyFormat(_))
        ));
        let not_pem = STANDARD.encode("hello");
        assert!(matches!(
            SigningKeys::from_base64(&not_pem, &not_pem),
            Err(TokenError::KeyFormat(_))
        ));
    }

    #[test]
    fn test_base64_keys_load() {
        let keys = SigningKeys::from_base64(
            &STANDARD.encode(ACCESS_PRIVATE),
            &STANDARD.encode(ACCESS_PUBLIC),
        );
        assert!(keys.is_ok());
    }

    #[test]
    fn test_access_and_refresh_keys_are_separate() {
        let tokens = test_tokens();
        let id = Uuid::new_v4();
        let access = tokens.issue_access(id).unwrap();
        let refresh = tokens.issue_refresh(id).unwrap();

        assert_eq!(tokens.validate_access(&access).unwrap(), id.to_string());
        assert_eq!(tokens.validate_refresh(&refresh).unwrap(), id.to_string());
        assert!(tokens.validate_access(&refresh).is_err());
        assert!(tokens.validate_refresh(&access).is_err());
    }
}
