use super::Parser;

/// Refresh-rotating token authentication service.
#[derive(Parser, Debug)]
#[command(name = "turnstile", version)]
pub struct Cli {
    /// Path to the settings file; defaults to `settings/dev.toml` in debug builds.
    #[arg(long)]
    pub settings: Option<String>,
}
