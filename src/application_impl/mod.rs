mod auth_middleware;
mod auth_service_impl;
mod jwt_signer;
mod rotation_service_impl;
mod token_authenticator;
mod token_purger;

pub use auth_middleware::*;
pub use auth_service_impl::*;
pub use jwt_signer::*;
pub use rotation_service_impl::*;
pub use token_authenticator::*;
pub use token_purger::*;
