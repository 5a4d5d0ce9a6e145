use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// Whitelist of live refresh tokens.
///
/// Existence of a record is the only thing that keeps a signed, unexpired
/// refresh token usable. Implementations must make `delete_by_id` atomic so
/// that two concurrent consumers of one record see exactly one `true`.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    async fn add(&self, record: &RefreshRecord) -> Result<(), AuthError>;

    async fn find_by_id(&self, token_id: TokenId) -> Result<Option<RefreshRecord>, AuthError>;

    /// Returns whether a record was actually removed.
    async fn delete_by_id(&self, token_id: TokenId) -> Result<bool, AuthError>;

    async fn delete_by_subject(&self, subject_id: &SubjectId) -> Result<(), AuthError>;

    /// Deletes every record of the subject and inserts `record`, as one unit.
    ///
    /// The default runs the two steps in sequence. If the insert fails the
    /// subject is left with no session rather than two.
    async fn replace_for_subject(&self, record: &RefreshRecord) -> Result<(), AuthError> {
        self.delete_by_subject(&record.subject_id).await?;
        self.add(record).await
    }

    /// Removes records with `expires_at <= now`, returning how many went away.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
}
