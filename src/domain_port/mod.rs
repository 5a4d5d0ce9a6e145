mod token_store;
mod user_store;

pub use token_store::*;
pub use user_store::*;
