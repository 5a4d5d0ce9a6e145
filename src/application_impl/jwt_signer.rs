use crate::domain_model::*;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Why a token was rejected. Only ever logged; callers see `Unauthorized`.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("signing key misconfigured: {0}")]
    Signing(String),
    #[error("unexpected signing algorithm")]
    AlgorithmMismatch,
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("expected {expected} token, got {actual}")]
    WrongTokenKind {
        expected: TokenKind,
        actual: TokenKind,
    },
    #[error("malformed token: {0}")]
    Malformed(String),
}

/// HS256 signing and verification of [`Claims`].
pub struct JwtHs256Signer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtHs256Signer {
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Signing("empty secret".to_string()));
        }

        // Expiry is checked against the caller's clock below, without leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Ok(JwtHs256Signer {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Checks, in order: algorithm, signature, expiry, kind.
    pub fn verify(
        &self,
        token: &str,
        expected_kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidAlgorithm => TokenError::AlgorithmMismatch,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;
        let claims = data.claims;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        if claims.kind != expected_kind {
            return Err(TokenError::WrongTokenKind {
                expected: expected_kind,
                actual: claims.kind,
            });
        }

        Ok(claims)
    }
}
