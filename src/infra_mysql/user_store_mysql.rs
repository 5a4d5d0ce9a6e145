use super::util::dup_key_name;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

// Unique index names from schema/mysql.sql.
const EMAIL_KEY: &str = "uq_app_user_email";
const USERNAME_KEY: &str = "uq_app_user_username";

pub struct MySqlUserStore {
    pool: MySqlPool,
}

impl MySqlUserStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserStore { pool }
    }

    async fn exists(&self, sql: &'static str, value: &str) -> Result<bool, AuthError> {
        let row = sqlx::query(sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let found: i64 = row
            .try_get("found")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(found != 0)
    }

    fn row_to_user(row: MySqlRow) -> Result<User, AuthError> {
        let id: String = row
            .try_get("subject_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let username: String = row
            .try_get("username")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(User {
            id: SubjectId(id),
            email,
            username,
            password_hash,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl UserStore for MySqlUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT subject_id, email, username, password_hash, created_at
FROM app_user
WHERE email = ?
"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_user).transpose()
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        self.exists("SELECT EXISTS(SELECT 1 FROM app_user WHERE email = ?) AS found", email)
            .await
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM app_user WHERE username = ?) AS found",
            username,
        )
        .await
    }

    async fn insert(&self, user: &User) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO app_user (subject_id, email, username, password_hash, created_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match dup_key_name(&e).as_deref() {
            Some(key) if key.ends_with(EMAIL_KEY) => AuthError::EmailTaken,
            Some(key) if key.ends_with(USERNAME_KEY) => AuthError::UsernameTaken,
            _ => AuthError::Store(e.to_string()),
        })?;
        Ok(())
    }
}
