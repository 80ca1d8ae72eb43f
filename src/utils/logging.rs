// Logging setup for the binary

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` overrides the default filter. Calling this twice is harmless;
/// the second installation attempt is ignored.
pub fn init(verbose: bool) {
    let default = if verbose { "rkjm=debug" } else { "rkjm=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
