use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "conchitas=info,tower_http=info";

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable. Calling it twice is harmless.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
