use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::{DashMap, DashSet};
use std::sync::Mutex;

/// Users keyed by email, with a username index. Inserts serialize on
/// `write_lock` so both uniqueness checks and the write happen together.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<String, User>,
    usernames: DashSet<String>,
    write_lock: Mutex<()>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(email).map(|u| u.value().clone()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.users.contains_key(email))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.usernames.contains(username))
    }

    async fn insert(&self, user: &User) -> Result<(), AuthError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AuthError::Store("memory user store lock poisoned".to_string()))?;

        if self.users.contains_key(&user.email) {
            return Err(AuthError::EmailTaken);
        }
        if self.usernames.contains(&user.username) {
            return Err(AuthError::UsernameTaken);
        }
        self.usernames.insert(user.username.clone());
        self.users.insert(user.email.clone(), user.clone());
        Ok(())
    }
}
