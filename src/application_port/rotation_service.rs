use super::AuthError;
use crate::domain_model::*;

/// Single-use, single-active-per-subject refresh token protocol.
#[async_trait::async_trait]
pub trait RotationService: Send + Sync {
    /// Issues a fresh pair and replaces any live refresh record of `subject_id`.
    async fn login(&self, subject_id: &SubjectId) -> Result<TokenPair, AuthError>;

    /// Verifies, consumes and reissues. Fails with `Unauthorized` when the
    /// token is invalid, unknown, or already consumed by a concurrent call.
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenPair, AuthError>;

    /// Same as [`RotationService::refresh`] for claims that already passed verification.
    async fn refresh_verified(&self, claims: &Claims) -> Result<TokenPair, AuthError>;

    /// Drops every live refresh record of `subject_id`.
    async fn logout(&self, subject_id: &SubjectId) -> Result<(), AuthError>;
}
