use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[cfg(debug_assertions)]
const DEV_SIGNING_KEY: &str = "my-dev-secret-key";

/// Wired services plus the background purge task.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub authenticator: Arc<TokenAuthenticator>,
    purge_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let signing_key = load_signing_key(&settings.auth.secret_env)?;
        let authenticator = Arc::new(TokenAuthenticator::new(AuthenticatorConfig {
            issuer: settings.auth.issuer.clone(),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_secs),
            signing_key,
        })?);

        let store = &settings.store;
        let pool = if store.users == "mysql" || store.tokens == "mysql" {
            let dsn = store
                .mysql_dsn
                .as_deref()
                .ok_or_else(|| anyhow!("store.mysql_dsn is required for the mysql backend"))?;
            Some(Pool::<MySql>::connect(dsn).await?)
        } else {
            None
        };

        let user_store: Arc<dyn UserStore> = match store.users.as_str() {
            "memory" => Arc::new(MemoryUserStore::new()),
            "mysql" => Arc::new(MySqlUserStore::new(mysql_pool(&pool)?)),
            other => return Err(anyhow!("Unknown user store backend: {}", other)),
        };

        let token_store: Arc<dyn TokenStore> = match store.tokens.as_str() {
            "memory" => Arc::new(MemoryTokenStore::new()),
            "mysql" => Arc::new(MySqlTokenStore::new(mysql_pool(&pool)?)),
            "redis" => {
                let dsn = store
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.redis_dsn is required for the redis backend"))?;
                let redis_client = redis::Client::open(dsn)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                let prefix = store.redis_prefix.as_deref().unwrap_or("turnstile");
                Arc::new(RedisTokenStore::new(redis_manager, prefix))
            }
            other => return Err(anyhow!("Unknown token store backend: {}", other)),
        };

        info!(users = %store.users, tokens = %store.tokens, "stores ready");

        Ok(Self::from_parts(
            authenticator,
            user_store,
            token_store,
            Duration::from_secs(settings.purge.interval_secs),
            pool,
        ))
    }

    /// Assembles the services around already-built stores. Must run inside a
    /// tokio runtime since it spawns the purge task.
    pub fn from_parts(
        authenticator: Arc<TokenAuthenticator>,
        user_store: Arc<dyn UserStore>,
        token_store: Arc<dyn TokenStore>,
        purge_interval: Duration,
        pool: Option<Pool<MySql>>,
    ) -> Self {
        let rotation_service: Arc<dyn RotationService> = Arc::new(RealRotationService::new(
            authenticator.clone(),
            token_store.clone(),
        ));
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_store,
            credential_hasher,
            rotation_service,
        ));

        let cancel = CancellationToken::new();
        let purger = TokenPurger::new(token_store, purge_interval, cancel.clone());
        let purge_handle = tokio::spawn(async move {
            purger.run().await;
        });

        info!("server started");

        Self {
            auth_service,
            authenticator,
            purge_handle: Mutex::new(Some(purge_handle)),
            cancel,
            pool,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = match self.purge_handle.lock() {
            Ok(mut lock) => lock.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let r = handle.await;
            info!("purge handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

fn mysql_pool(pool: &Option<Pool<MySql>>) -> anyhow::Result<Pool<MySql>> {
    pool.clone()
        .ok_or_else(|| anyhow!("mysql pool was not initialized"))
}

fn load_signing_key(var: &str) -> anyhow::Result<Vec<u8>> {
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(key.into_bytes()),
        #[cfg(debug_assertions)]
        _ => {
            warn!("{} is not set, using the development signing key", var);
            Ok(DEV_SIGNING_KEY.as_bytes().to_vec())
        }
        #[cfg(not(debug_assertions))]
        _ => Err(anyhow!("signing secret {} is not set", var)),
    }
}
