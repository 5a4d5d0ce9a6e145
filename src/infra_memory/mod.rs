mod token_store_memory;
mod user_store_memory;

pub use token_store_memory::*;
pub use user_store_memory::*;
