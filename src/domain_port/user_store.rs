use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError>;

    /// Fails with `EmailTaken` or `UsernameTaken` when either is already registered.
    async fn insert(&self, user: &User) -> Result<(), AuthError>;
}
