//! CLI arguments and the TOML settings file.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
