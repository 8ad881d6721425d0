use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. An explicit `level` wins over `RUST_LOG`, which
/// wins over the `info` default. Logs go to stderr so command output stays clean.
pub fn setup_tracing(level: Option<&str>) {
    let env_filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
