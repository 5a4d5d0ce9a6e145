use super::{JwtHs256Signer, TokenError};
use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, SubsecRound, Utc};
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct AuthenticatorConfig {
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub signing_key: Vec<u8>,
}

/// Sole owner of the signing secret and issuer identity.
///
/// Built once at startup and shared behind an `Arc`; every method is pure
/// in-memory work and never suspends.
pub struct TokenAuthenticator {
    signer: JwtHs256Signer,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenAuthenticator {
    pub fn new(cfg: AuthenticatorConfig) -> Result<Self, AuthError> {
        let signer = JwtHs256Signer::new(&cfg.signing_key)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        let now = Utc::now();
        expiry_after(now, cfg.access_ttl)?;
        expiry_after(now, cfg.refresh_ttl)?;
        Ok(TokenAuthenticator {
            signer,
            issuer: cfg.issuer,
            access_ttl: cfg.access_ttl,
            refresh_ttl: cfg.refresh_ttl,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_access_token(
        &self,
        subject_id: &SubjectId,
        ttl: Duration,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        self.issue_access_token_at(subject_id, ttl, Utc::now())
    }

    pub fn issue_access_token_at(
        &self,
        subject_id: &SubjectId,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let claims = self.build_claims(None, subject_id, TokenKind::Access, ttl, now)?;
        let token = self.sign(&claims)?;
        Ok((AccessToken(token), claims.expires_at))
    }

    /// `token_id` comes from the caller so it can be persisted alongside issuance.
    pub fn issue_refresh_token(
        &self,
        token_id: TokenId,
        subject_id: &SubjectId,
        ttl: Duration,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        self.issue_refresh_token_at(token_id, subject_id, ttl, Utc::now())
    }

    pub fn issue_refresh_token_at(
        &self,
        token_id: TokenId,
        subject_id: &SubjectId,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        let claims = self.build_claims(Some(token_id), subject_id, TokenKind::Refresh, ttl, now)?;
        let token = self.sign(&claims)?;
        Ok((RefreshToken(token), claims.expires_at))
    }

    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        self.verify_at(token, kind, Utc::now())
    }

    pub fn verify_at(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, AuthError> {
        self.signer.verify(token, kind, now).map_err(|e| {
            debug!(error = %e, expected = %kind, "token rejected");
            AuthError::Unauthorized
        })
    }

    fn build_claims(
        &self,
        token_id: Option<TokenId>,
        subject_id: &SubjectId,
        kind: TokenKind,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Claims, AuthError> {
        let issued_at = now.trunc_subsecs(0);
        Ok(Claims {
            token_id,
            subject_id: subject_id.clone(),
            kind,
            issuer: self.issuer.clone(),
            issued_at,
            expires_at: expiry_after(issued_at, ttl)?,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        self.signer.sign(claims).map_err(|e: TokenError| {
            error!(error = %e, "token signing failed");
            AuthError::InternalError(e.to_string())
        })
    }
}

fn expiry_after(issued_at: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, AuthError> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| issued_at.checked_add_signed(ttl))
        .ok_or_else(|| AuthError::InternalError(format!("token ttl out of range: {ttl:?}")))
}
