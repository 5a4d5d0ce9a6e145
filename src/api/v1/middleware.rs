use super::error::ApiErrorCode;
use crate::application_impl::AuthMiddleware;
use crate::domain_model::Claims;
use warp::{Filter, reject};

/// warp binding of [`AuthMiddleware`]: extracts verified [`Claims`] or rejects
/// with `Unauthorized` before the handler runs.
pub fn with_claims(
    middleware: AuthMiddleware,
) -> impl Filter<Extract = (Claims,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let middleware = middleware.clone();
        async move {
            middleware
                .authenticate(header.as_deref())
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)
        }
    })
}
