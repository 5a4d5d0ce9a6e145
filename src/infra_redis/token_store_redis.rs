use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisWrite, Script, ToRedisArgs};
use std::collections::HashMap;

// KEYS[1] record key; ARGV[1] subject key prefix, ARGV[2] token id
const DELETE_BY_ID_LUA: &str = r#"
local subject = redis.call('HGET', KEYS[1], 'subject')
if not subject then return 0 end
redis.call('DEL', KEYS[1])
redis.call('SREM', ARGV[1] .. subject, ARGV[2])
return 1
"#;

// KEYS[1] subject key; ARGV[1] record key prefix
const DELETE_BY_SUBJECT_LUA: &str = r#"
local ids = redis.call('SMEMBERS', KEYS[1])
for _, id in ipairs(ids) do redis.call('DEL', ARGV[1] .. id) end
redis.call('DEL', KEYS[1])
return #ids
"#;

// KEYS[1] subject key, KEYS[2] record key
// ARGV[1] record key prefix, ARGV[2] token id, ARGV[3] subject, ARGV[4] expires_at, ARGV[5] ttl
const REPLACE_LUA: &str = r#"
local ids = redis.call('SMEMBERS', KEYS[1])
for _, id in ipairs(ids) do redis.call('DEL', ARGV[1] .. id) end
redis.call('DEL', KEYS[1])
redis.call('HSET', KEYS[2], 'subject', ARGV[3], 'expires_at', ARGV[4])
redis.call('EXPIRE', KEYS[2], ARGV[5])
redis.call('SADD', KEYS[1], ARGV[2])
redis.call('EXPIRE', KEYS[1], ARGV[5])
return 1
"#;

/// Refresh whitelist in Redis.
///
/// Each record is a hash `{prefix}:rt:{token_id}` holding the subject and
/// expiry, and each subject owns a set `{prefix}:sub:{subject}` of its token
/// ids. Multi-key updates run as Lua scripts so they apply atomically. Keys
/// carry a TTL matching the token, so expired records vanish on their own.
pub struct RedisTokenStore {
    conn: ConnectionManager,
    prefix: String,
    delete_by_id_script: Script,
    delete_by_subject_script: Script,
    replace_script: Script,
}

impl RedisTokenStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisTokenStore {
            conn,
            prefix: prefix.into(),
            delete_by_id_script: Script::new(DELETE_BY_ID_LUA),
            delete_by_subject_script: Script::new(DELETE_BY_SUBJECT_LUA),
            replace_script: Script::new(REPLACE_LUA),
        }
    }

    fn record_prefix(&self) -> String {
        format!("{}:rt:", self.prefix)
    }

    fn subject_prefix(&self) -> String {
        format!("{}:sub:", self.prefix)
    }

    fn record_key(&self, token_id: TokenId) -> String {
        format!("{}{}", self.record_prefix(), token_id)
    }

    fn subject_key(&self, subject_id: &SubjectId) -> String {
        format!("{}{}", self.subject_prefix(), subject_id)
    }

    fn ttl_secs(until: DateTime<Utc>) -> i64 {
        let secs = (until - Utc::now()).num_seconds();
        if secs <= 0 { 1 } else { secs }
    }
}

impl ToRedisArgs for TokenId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.to_string().as_bytes())
    }
}

impl ToRedisArgs for SubjectId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.as_str().as_bytes())
    }
}

#[async_trait::async_trait]
impl TokenStore for RedisTokenStore {
    async fn add(&self, record: &RefreshRecord) -> Result<(), AuthError> {
        let record_key = self.record_key(record.token_id);
        let subject_key = self.subject_key(&record.subject_id);
        let ttl = Self::ttl_secs(record.expires_at);
        let mut conn = self.conn.clone();

        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(
                &record_key,
                &[
                    ("subject", record.subject_id.to_string()),
                    ("expires_at", record.expires_at.timestamp().to_string()),
                ],
            )
            .ignore()
            .expire(&record_key, ttl)
            .ignore()
            .sadd(&subject_key, record.token_id)
            .ignore()
            .expire(&subject_key, ttl)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn find_by_id(&self, token_id: TokenId) -> Result<Option<RefreshRecord>, AuthError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn
            .hgetall(self.record_key(token_id))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        if fields.is_empty() {
            return Ok(None);
        }

        let subject = fields
            .get("subject")
            .ok_or_else(|| AuthError::Store("refresh record without subject".to_string()))?;
        let expires_at = fields
            .get("expires_at")
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .ok_or_else(|| AuthError::Store("refresh record without valid expiry".to_string()))?;

        Ok(Some(RefreshRecord {
            token_id,
            subject_id: SubjectId(subject.clone()),
            expires_at,
        }))
    }

    async fn delete_by_id(&self, token_id: TokenId) -> Result<bool, AuthError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .delete_by_id_script
            .key(self.record_key(token_id))
            .arg(self.subject_prefix())
            .arg(token_id)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(deleted > 0)
    }

    async fn delete_by_subject(&self, subject_id: &SubjectId) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let _: i64 = self
            .delete_by_subject_script
            .key(self.subject_key(subject_id))
            .arg(self.record_prefix())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn replace_for_subject(&self, record: &RefreshRecord) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let _: i64 = self
            .replace_script
            .key(self.subject_key(&record.subject_id))
            .key(self.record_key(record.token_id))
            .arg(self.record_prefix())
            .arg(record.token_id)
            .arg(&record.subject_id)
            .arg(record.expires_at.timestamp())
            .arg(Self::ttl_secs(record.expires_at))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<u64, AuthError> {
        // Key TTLs already evict expired records.
        Ok(0)
    }
}
