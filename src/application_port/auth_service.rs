use crate::domain_model::*;

/// Failures crossing the service ports.
///
/// `Unauthorized` covers every token rejection (bad signature, expiry, wrong
/// kind, revoked or unknown refresh id) and never says which one applied.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already in use")]
    EmailTaken,
    #[error("username already in use")]
    UsernameTaken,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub subject_id: SubjectId,
    pub tokens: TokenPair,
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

/// Credential-facing entry points used by the HTTP handlers.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn signup(&self, request: SignupInput) -> Result<SubjectId, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    /// Rotates the refresh token whose claims were already verified by the middleware.
    async fn refresh(&self, claims: &Claims) -> Result<TokenPair, AuthError>;
    async fn logout(&self, subject_id: &SubjectId) -> Result<(), AuthError>;
}
