//! Tracing subscriber setup for the `doclens` binary.
//!
//! Logs go to stderr so that stdout carries only rendered views. `RUST_LOG`
//! takes precedence over the default level.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default = if verbose { "doclens=debug" } else { "doclens=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
