use tracing_subscriber::EnvFilter;

/// Initialize console logging.
///
/// The level can be overridden with `RUST_LOG`; engine warnings surface at
/// `warn`, per-batch progress at `debug`.
pub fn init(level: &str) {
    let default_filter = format!("horizon={level},horizon_core=warn");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
