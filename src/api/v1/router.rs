use super::handler;
use super::middleware::with_claims;
use crate::application_impl::AuthMiddleware;
use crate::domain_model::TokenKind;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let access_guard = AuthMiddleware::new(server.authenticator.clone(), TokenKind::Access);
    let refresh_guard = AuthMiddleware::new(server.authenticator.clone(), TokenKind::Refresh);

    let signup = warp::post()
        .and(warp::path("signup"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::signup);

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(with_claims(refresh_guard))
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(with_claims(access_guard.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let whoami = warp::get()
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(with_claims(access_guard))
        .and_then(handler::whoami);

    signup.or(login).or(refresh).or(logout).or(whoami)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}
