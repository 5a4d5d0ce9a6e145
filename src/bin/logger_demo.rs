use turnstile::application_impl::*;
use turnstile::domain_model::*;
use turnstile::logger::*;
use turnstile::settings::Log;

// Rejection causes are logged at debug inside the authenticator, so the same
// bad token is silent under the bootstrap filter and visible after a reload.
fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    let authenticator = TokenAuthenticator::new(AuthenticatorConfig {
        issuer: "turnstile.demo".to_string(),
        access_ttl: DEFAULT_ACCESS_TTL,
        refresh_ttl: DEFAULT_REFRESH_TTL,
        signing_key: b"logger-demo-key".to_vec(),
    })?;

    let subject = SubjectId::from("demo-user");
    let (access, _) = authenticator.issue_access_token(&subject, DEFAULT_ACCESS_TTL)?;
    info!(subject = %subject, "issued access token");

    let rejected = authenticator.verify(&access.0, TokenKind::Refresh);
    info!(rejected = rejected.is_err(), "access token checked as refresh (cause hidden)");

    logger.reload_from_settings(&Log {
        filter: "turnstile=debug".to_string(),
    })?;

    let rejected = authenticator.verify(&access.0, TokenKind::Refresh);
    info!(rejected = rejected.is_err(), "access token checked as refresh (cause logged)");
    let rejected = authenticator.verify("not.a.token", TokenKind::Access);
    info!(rejected = rejected.is_err(), "garbage checked as access");

    Ok(())
}
