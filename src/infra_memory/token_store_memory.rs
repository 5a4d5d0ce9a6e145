use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Mutex, MutexGuard};

/// Process-local whitelist. Subject-wide operations serialize on `write_lock`;
/// `delete_by_id` relies on the map's own atomic removal.
#[derive(Default)]
pub struct MemoryTokenStore {
    records: DashMap<TokenId, RefreshRecord>,
    write_lock: Mutex<()>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, AuthError> {
        self.write_lock
            .lock()
            .map_err(|_| AuthError::Store("memory token store lock poisoned".to_string()))
    }

    fn remove_subject(&self, subject_id: &SubjectId) {
        self.records.retain(|_, r| &r.subject_id != subject_id);
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn add(&self, record: &RefreshRecord) -> Result<(), AuthError> {
        let _guard = self.lock()?;
        self.records.insert(record.token_id, record.clone());
        Ok(())
    }

    async fn find_by_id(&self, token_id: TokenId) -> Result<Option<RefreshRecord>, AuthError> {
        Ok(self.records.get(&token_id).map(|r| r.value().clone()))
    }

    async fn delete_by_id(&self, token_id: TokenId) -> Result<bool, AuthError> {
        Ok(self.records.remove(&token_id).is_some())
    }

    async fn delete_by_subject(&self, subject_id: &SubjectId) -> Result<(), AuthError> {
        let _guard = self.lock()?;
        self.remove_subject(subject_id);
        Ok(())
    }

    async fn replace_for_subject(&self, record: &RefreshRecord) -> Result<(), AuthError> {
        let _guard = self.lock()?;
        self.remove_subject(&record.subject_id);
        self.records.insert(record.token_id, record.clone());
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let _guard = self.lock()?;
        let before = self.records.len();
        self.records.retain(|_, r| r.expires_at > now);
        Ok(before.saturating_sub(self.records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn record(subject: &str, expires_at: DateTime<Utc>) -> RefreshRecord {
        RefreshRecord {
            token_id: TokenId::new(),
            subject_id: SubjectId::from(subject),
            expires_at,
        }
    }

    #[tokio::test]
    async fn delete_by_id_reports_whether_anything_went_away() {
        let store = MemoryTokenStore::new();
        let rec = record("u1", Utc::now() + Duration::days(1));
        store.add(&rec).await.unwrap();

        assert_eq!(store.find_by_id(rec.token_id).await.unwrap(), Some(rec.clone()));
        assert!(store.delete_by_id(rec.token_id).await.unwrap());
        assert!(!store.delete_by_id(rec.token_id).await.unwrap());
        assert_eq!(store.find_by_id(rec.token_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn replace_keeps_a_single_record_per_subject() {
        let store = MemoryTokenStore::new();
        let exp = Utc::now() + Duration::days(1);
        let first = record("u1", exp);
        let other = record("u2", exp);
        store.add(&first).await.unwrap();
        store.add(&other).await.unwrap();

        let second = record("u1", exp);
        store.replace_for_subject(&second).await.unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.find_by_id(first.token_id).await.unwrap().is_none());
        assert!(store.find_by_id(second.token_id).await.unwrap().is_some());
        assert!(store.find_by_id(other.token_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn purge_removes_records_at_or_past_expiry() {
        let store = MemoryTokenStore::new();
        let now = Utc::now();
        store.add(&record("u1", now - Duration::seconds(5))).await.unwrap();
        store.add(&record("u2", now)).await.unwrap();
        let live = record("u3", now + Duration::seconds(5));
        store.add(&live).await.unwrap();

        assert_eq!(store.purge_expired(now).await.unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.find_by_id(live.token_id).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deletes_of_one_record_succeed_once() {
        let store = Arc::new(MemoryTokenStore::new());
        let rec = record("u1", Utc::now() + Duration::days(1));
        store.add(&rec).await.unwrap();
        let token_id = rec.token_id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.delete_by_id(token_id).await.unwrap() })
            })
            .collect();

        let mut deleted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                deleted += 1;
            }
        }
        assert_eq!(deleted, 1);
    }
}
