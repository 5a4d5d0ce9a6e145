mod error;
mod handler;
mod middleware;
mod router;

pub use error::{ApiErrorCode, recover_error};
pub use middleware::with_claims;
pub use router::routes;
