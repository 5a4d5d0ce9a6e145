mod auth_service;
mod rotation_service;

pub use auth_service::*;
pub use rotation_service::*;
