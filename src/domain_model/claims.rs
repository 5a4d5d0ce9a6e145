use super::{SubjectId, TokenId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Identity and expiry data carried inside a bearer token.
///
/// Claims are built fresh on every issuance and never mutated afterwards.
/// `token_id` is only set on refresh tokens, where it keys the persisted
/// whitelist record. Timestamps travel as whole seconds since the epoch.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "jti", default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<TokenId>,
    #[serde(rename = "sub")]
    pub subject_id: SubjectId,
    pub kind: TokenKind,
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// `expires_at` is authoritative; the exact boundary counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(kind: TokenKind, token_id: Option<TokenId>) -> Claims {
        Claims {
            token_id,
            subject_id: SubjectId::from("u1"),
            kind,
            issuer: "turnstile".to_string(),
            issued_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            expires_at: Utc.timestamp_opt(1_700_000_600, 0).unwrap(),
        }
    }

    #[test]
    fn access_claims_omit_jti_on_the_wire() {
        let value = serde_json::to_value(sample(TokenKind::Access, None)).unwrap();
        assert!(value.get("jti").is_none());
        assert_eq!(value["sub"], "u1");
        assert_eq!(value["kind"], "access");
        assert_eq!(value["iat"], 1_700_000_000i64);
        assert_eq!(value["exp"], 1_700_000_600i64);
    }

    #[test]
    fn refresh_claims_carry_jti() {
        let id = TokenId::new();
        let value = serde_json::to_value(sample(TokenKind::Refresh, Some(id))).unwrap();
        assert_eq!(value["jti"], id.to_string());
        assert_eq!(value["kind"], "refresh");
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let claims = sample(TokenKind::Access, None);
        assert!(!claims.is_expired_at(claims.expires_at - chrono::Duration::seconds(1)));
        assert!(claims.is_expired_at(claims.expires_at));
        assert!(claims.is_expired_at(claims.expires_at + chrono::Duration::seconds(1)));
    }
}
