use super::TokenAuthenticator;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tracing::{debug, info};

pub struct RealRotationService {
    authenticator: Arc<TokenAuthenticator>,
    token_store: Arc<dyn TokenStore>,
}

impl RealRotationService {
    pub fn new(authenticator: Arc<TokenAuthenticator>, token_store: Arc<dyn TokenStore>) -> Self {
        Self {
            authenticator,
            token_store,
        }
    }

    async fn issue_pair(&self, subject_id: &SubjectId) -> Result<TokenPair, AuthError> {
        let token_id = TokenId::new();

        let (refresh_token, refresh_exp) = self.authenticator.issue_refresh_token(
            token_id,
            subject_id,
            self.authenticator.refresh_ttl(),
        )?;
        let (access_token, _) = self
            .authenticator
            .issue_access_token(subject_id, self.authenticator.access_ttl())?;

        let record = RefreshRecord {
            token_id,
            subject_id: subject_id.clone(),
            expires_at: refresh_exp,
        };
        self.token_store.replace_for_subject(&record).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

#[async_trait::async_trait]
impl RotationService for RealRotationService {
    async fn login(&self, subject_id: &SubjectId) -> Result<TokenPair, AuthError> {
        let pair = self.issue_pair(subject_id).await?;
        info!(subject = %subject_id, "session started");
        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenPair, AuthError> {
        let claims = self
            .authenticator
            .verify(&refresh_token.0, TokenKind::Refresh)?;
        self.refresh_verified(&claims).await
    }

    async fn refresh_verified(&self, claims: &Claims) -> Result<TokenPair, AuthError> {
        if claims.kind != TokenKind::Refresh {
            return Err(AuthError::Unauthorized);
        }
        let token_id = claims.token_id.ok_or(AuthError::Unauthorized)?;

        let record = match self.token_store.find_by_id(token_id).await? {
            Some(record) => record,
            None => {
                debug!(%token_id, "refresh token not whitelisted");
                return Err(AuthError::Unauthorized);
            }
        };
        if record.subject_id != claims.subject_id {
            debug!(%token_id, "refresh token subject does not match its record");
            return Err(AuthError::Unauthorized);
        }

        // Consume. Losing this race means another refresh already used the token.
        if !self.token_store.delete_by_id(token_id).await? {
            debug!(%token_id, "refresh token consumed concurrently");
            return Err(AuthError::Unauthorized);
        }

        let pair = self.issue_pair(&record.subject_id).await?;
        info!(subject = %record.subject_id, "session rotated");
        Ok(pair)
    }

    async fn logout(&self, subject_id: &SubjectId) -> Result<(), AuthError> {
        self.token_store.delete_by_subject(subject_id).await?;
        info!(subject = %subject_id, "session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{AuthenticatorConfig, DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL};
    use crate::infra_memory::MemoryTokenStore;
    use chrono::{DateTime, Utc};

    fn authenticator() -> Arc<TokenAuthenticator> {
        Arc::new(
            TokenAuthenticator::new(AuthenticatorConfig {
                issuer: "turnstile.test".to_string(),
                access_ttl: DEFAULT_ACCESS_TTL,
                refresh_ttl: DEFAULT_REFRESH_TTL,
                signing_key: b"rotation-secret".to_vec(),
            })
            .unwrap(),
        )
    }

    fn setup() -> (Arc<RealRotationService>, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new());
        let service = Arc::new(RealRotationService::new(authenticator(), store.clone()));
        (service, store)
    }

    #[tokio::test]
    async fn login_persists_exactly_one_record() {
        let (service, store) = setup();
        let pair = service.login(&SubjectId::from("u1")).await.unwrap();

        assert_eq!(store.len(), 1);
        let claims = authenticator()
            .verify(&pair.refresh_token.0, TokenKind::Refresh)
            .unwrap();
        let record = store
            .find_by_id(claims.token_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.subject_id, SubjectId::from("u1"));
        assert_eq!(record.expires_at, claims.expires_at);
    }

    #[tokio::test]
    async fn refresh_rotates_and_the_original_token_stops_working() {
        let (service, store) = setup();
        let subject = SubjectId::from("u1");
        let first = service.login(&subject).await.unwrap();

        let second = service.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);
        assert_eq!(store.len(), 1);

        let claims = authenticator()
            .verify(&second.access_token.0, TokenKind::Access)
            .unwrap();
        assert_eq!(claims.subject_id, subject);

        assert!(matches!(
            service.refresh(&first.refresh_token).await,
            Err(AuthError::Unauthorized)
        ));
        assert!(service.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn second_login_invalidates_the_first_refresh_token() {
        let (service, store) = setup();
        let subject = SubjectId::from("u1");
        let first = service.login(&subject).await.unwrap();
        let second = service.login(&subject).await.unwrap();

        assert_eq!(store.len(), 1);
        assert!(matches!(
            service.refresh(&first.refresh_token).await,
            Err(AuthError::Unauthorized)
        ));
        assert!(service.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn sessions_of_other_subjects_are_untouched() {
        let (service, store) = setup();
        let alice = service.login(&SubjectId::from("alice")).await.unwrap();
        service.login(&SubjectId::from("bob")).await.unwrap();
        service.login(&SubjectId::from("bob")).await.unwrap();

        assert_eq!(store.len(), 2);
        assert!(service.refresh(&alice.refresh_token).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_refresh_with_one_token_succeeds_once() {
        let (service, _) = setup();
        let pair = service.login(&SubjectId::from("u1")).await.unwrap();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let service = service.clone();
                let token = pair.refresh_token.clone();
                tokio::spawn(async move { service.refresh(&token).await })
            })
            .collect();

        let mut successes = 0;
        let mut rejections = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(AuthError::Unauthorized) => rejections += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(rejections, 1);
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let (service, _) = setup();
        let pair = service.login(&SubjectId::from("u1")).await.unwrap();

        let disguised = RefreshToken(pair.access_token.0.clone());
        assert!(matches!(
            service.refresh(&disguised).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn signed_but_unlisted_refresh_token_is_rejected() {
        let (service, _) = setup();
        let (forged, _) = authenticator()
            .issue_refresh_token(TokenId::new(), &SubjectId::from("u1"), DEFAULT_REFRESH_TTL)
            .unwrap();

        assert!(matches!(
            service.refresh(&forged).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn record_for_another_subject_is_rejected() {
        let (service, store) = setup();
        let token_id = TokenId::new();
        let (token, exp) = authenticator()
            .issue_refresh_token(token_id, &SubjectId::from("mallory"), DEFAULT_REFRESH_TTL)
            .unwrap();
        store
            .add(&RefreshRecord {
                token_id,
                subject_id: SubjectId::from("alice"),
                expires_at: exp,
            })
            .await
            .unwrap();

        assert!(matches!(
            service.refresh(&token).await,
            Err(AuthError::Unauthorized)
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn logout_revokes_the_refresh_token() {
        let (service, store) = setup();
        let subject = SubjectId::from("u1");
        let pair = service.login(&subject).await.unwrap();

        service.logout(&subject).await.unwrap();

        assert!(store.is_empty());
        assert!(matches!(
            service.refresh(&pair.refresh_token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    /// Deletes work, inserts fail.
    struct InsertFailingStore {
        inner: MemoryTokenStore,
    }

    #[async_trait::async_trait]
    impl TokenStore for InsertFailingStore {
        async fn add(&self, _record: &RefreshRecord) -> Result<(), AuthError> {
            Err(AuthError::Store("insert refused".to_string()))
        }

        async fn find_by_id(&self, token_id: TokenId) -> Result<Option<RefreshRecord>, AuthError> {
            self.inner.find_by_id(token_id).await
        }

        async fn delete_by_id(&self, token_id: TokenId) -> Result<bool, AuthError> {
            self.inner.delete_by_id(token_id).await
        }

        async fn delete_by_subject(&self, subject_id: &SubjectId) -> Result<(), AuthError> {
            self.inner.delete_by_subject(subject_id).await
        }

        async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
            self.inner.purge_expired(now).await
        }
    }

    #[tokio::test]
    async fn failed_insert_leaves_no_session_and_surfaces_store_error() {
        let auth = authenticator();
        let store = Arc::new(InsertFailingStore {
            inner: MemoryTokenStore::new(),
        });

        let token_id = TokenId::new();
        let subject = SubjectId::from("u1");
        let (old_token, exp) = auth
            .issue_refresh_token(token_id, &subject, DEFAULT_REFRESH_TTL)
            .unwrap();
        store
            .inner
            .add(&RefreshRecord {
                token_id,
                subject_id: subject.clone(),
                expires_at: exp,
            })
            .await
            .unwrap();

        let service = RealRotationService::new(auth, store.clone());
        assert!(matches!(
            service.login(&subject).await,
            Err(AuthError::Store(_))
        ));
        assert!(store.inner.is_empty());
        assert!(matches!(
            service.refresh(&old_token).await,
            Err(AuthError::Unauthorized)
        ));
    }
}
