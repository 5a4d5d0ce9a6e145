use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

/// Refresh whitelist in the `refresh_token` table (see `schema/mysql.sql`).
pub struct MySqlTokenStore {
    pool: MySqlPool,
}

impl MySqlTokenStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlTokenStore { pool }
    }

    #[inline]
    fn tid_as_bytes(id: &TokenId) -> &[u8] {
        id.0.as_bytes()
    }

    fn row_to_record(row: MySqlRow) -> Result<RefreshRecord, AuthError> {
        let id_bytes: Vec<u8> = row
            .try_get("token_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let token_id = TokenId(
            Uuid::from_slice(&id_bytes).map_err(|e| AuthError::Store(e.to_string()))?,
        );
        let subject_id: String = row
            .try_get("subject_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let expires_at: DateTime<Utc> = row
            .try_get("expires_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(RefreshRecord {
            token_id,
            subject_id: SubjectId(subject_id),
            expires_at,
        })
    }
}

const INSERT_SQL: &str = r#"
INSERT INTO refresh_token (token_id, subject_id, expires_at)
VALUES (?, ?, ?)
"#;

const DELETE_BY_SUBJECT_SQL: &str = "DELETE FROM refresh_token WHERE subject_id = ?";

#[async_trait::async_trait]
impl TokenStore for MySqlTokenStore {
    async fn add(&self, record: &RefreshRecord) -> Result<(), AuthError> {
        sqlx::query(INSERT_SQL)
            .bind(Self::tid_as_bytes(&record.token_id))
            .bind(record.subject_id.as_str())
            .bind(record.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn find_by_id(&self, token_id: TokenId) -> Result<Option<RefreshRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT token_id, subject_id, expires_at
FROM refresh_token
WHERE token_id = ?
"#,
        )
        .bind(Self::tid_as_bytes(&token_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn delete_by_id(&self, token_id: TokenId) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_token WHERE token_id = ?")
            .bind(Self::tid_as_bytes(&token_id))
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_subject(&self, subject_id: &SubjectId) -> Result<(), AuthError> {
        sqlx::query(DELETE_BY_SUBJECT_SQL)
            .bind(subject_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn replace_for_subject(&self, record: &RefreshRecord) -> Result<(), AuthError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        sqlx::query(DELETE_BY_SUBJECT_SQL)
            .bind(record.subject_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        sqlx::query(INSERT_SQL)
            .bind(Self::tid_as_bytes(&record.token_id))
            .bind(record.subject_id.as_str())
            .bind(record.expires_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_token WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(result.rows_affected())
    }
}
