use super::TokenAuthenticator;
use crate::application_port::*;
use crate::domain_model::*;
use std::sync::Arc;
use tracing::debug;

const BEARER_PREFIX: &str = "Bearer ";

/// Request interceptor guarding endpoints that need a specific token kind.
///
/// Transport bindings pass the raw `Authorization` header value in and hand
/// the returned [`Claims`] to the downstream handler. Handlers never parse
/// tokens themselves.
#[derive(Clone)]
pub struct AuthMiddleware {
    authenticator: Arc<TokenAuthenticator>,
    required_kind: TokenKind,
}

impl AuthMiddleware {
    pub fn new(authenticator: Arc<TokenAuthenticator>, required_kind: TokenKind) -> Self {
        Self {
            authenticator,
            required_kind,
        }
    }

    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Claims, AuthError> {
        let Some(header) = authorization else {
            debug!("missing authorization header");
            return Err(AuthError::Unauthorized);
        };
        let token = match header.strip_prefix(BEARER_PREFIX) {
            Some(token) if !token.trim().is_empty() => token.trim(),
            _ => {
                debug!("authorization header is not a bearer credential");
                return Err(AuthError::Unauthorized);
            }
        };
        self.authenticator.verify(token, self.required_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{AuthenticatorConfig, DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL};

    fn authenticator() -> Arc<TokenAuthenticator> {
        Arc::new(
            TokenAuthenticator::new(AuthenticatorConfig {
                issuer: "turnstile.test".to_string(),
                access_ttl: DEFAULT_ACCESS_TTL,
                refresh_ttl: DEFAULT_REFRESH_TTL,
                signing_key: b"middleware-secret".to_vec(),
            })
            .unwrap(),
        )
    }

    #[test]
    fn bearer_access_token_yields_claims() {
        let auth = authenticator();
        let middleware = AuthMiddleware::new(auth.clone(), TokenKind::Access);
        let (token, _) = auth
            .issue_access_token(&SubjectId::from("u1"), DEFAULT_ACCESS_TTL)
            .unwrap();

        let claims = middleware
            .authenticate(Some(&format!("Bearer {}", token.0)))
            .unwrap();
        assert_eq!(claims.subject_id, SubjectId::from("u1"));
    }

    #[test]
    fn missing_or_non_bearer_header_is_unauthorized() {
        let auth = authenticator();
        let middleware = AuthMiddleware::new(auth.clone(), TokenKind::Access);
        let (token, _) = auth
            .issue_access_token(&SubjectId::from("u1"), DEFAULT_ACCESS_TTL)
            .unwrap();

        for header in [None, Some(""), Some("Bearer "), Some("Basic dTE6cHc=")] {
            assert!(matches!(
                middleware.authenticate(header),
                Err(AuthError::Unauthorized)
            ));
        }
        assert!(matches!(
            middleware.authenticate(Some(&token.0)),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn wrong_kind_is_unauthorized() {
        let auth = authenticator();
        let refresh_guard = AuthMiddleware::new(auth.clone(), TokenKind::Refresh);
        let (token, _) = auth
            .issue_access_token(&SubjectId::from("u1"), DEFAULT_ACCESS_TTL)
            .unwrap();

        assert!(matches!(
            refresh_guard.authenticate(Some(&format!("Bearer {}", token.0))),
            Err(AuthError::Unauthorized)
        ));
    }
}
