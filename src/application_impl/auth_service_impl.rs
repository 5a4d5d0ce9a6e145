use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub struct Argon2PasswordHasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::InternalError(format!("verify error: {e}"))),
        }
    }
}

pub struct RealAuthService {
    user_store: Arc<dyn UserStore>,
    credential_hasher: Arc<dyn CredentialHasher>,
    rotation_service: Arc<dyn RotationService>,
}

impl RealAuthService {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        credential_hasher: Arc<dyn CredentialHasher>,
        rotation_service: Arc<dyn RotationService>,
    ) -> Self {
        Self {
            user_store,
            credential_hasher,
            rotation_service,
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn signup(&self, request: SignupInput) -> Result<SubjectId, AuthError> {
        let SignupInput {
            email,
            username,
            password,
        } = request;

        if self.user_store.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }
        if self.user_store.username_exists(&username).await? {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let user = User {
            id: SubjectId::new_random(),
            email,
            username,
            password_hash,
            created_at: Utc::now(),
        };
        self.user_store.insert(&user).await?;

        info!(subject = %user.id, "user registered");
        Ok(user.id)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        let user = self
            .user_store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let ok = self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.rotation_service.login(&user.id).await?;
        Ok(LoginResult {
            subject_id: user.id,
            tokens,
        })
    }

    async fn refresh(&self, claims: &Claims) -> Result<TokenPair, AuthError> {
        self.rotation_service.refresh_verified(claims).await
    }

    async fn logout(&self, subject_id: &SubjectId) -> Result<(), AuthError> {
        self.rotation_service.logout(subject_id).await
    }
}
