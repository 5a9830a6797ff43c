use tracing_subscriber::EnvFilter;

/// Initialize structured logging on stderr with `RUST_LOG` support.
///
/// Defaults to `git_provenance=info`. Uses `try_init` so a second call (for
/// example from tests) is ignored instead of panicking.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("git_provenance=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
