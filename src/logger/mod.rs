//! Tracing subscriber setup. Call sites use the re-exported macros.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
