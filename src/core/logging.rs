//! Logging initialization

/// Initialize the logging system with a default filter of `info`.
///
/// Override with the RUST_LOG environment variable, e.g.
/// `RUST_LOG=strata::world=trace` to follow every proximity update.
///
/// # Example
/// ```
/// strata::core::logging::init();
/// log::info!("World renderer starting");
/// ```
pub fn init() {
    init_with_filter("info");
}

/// Initialize logging with an explicit default filter and millisecond
/// timestamps. Safe to call more than once; later calls are ignored.
pub fn init_with_filter(default_filter: &str) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .format_timestamp_millis()
    .try_init();
}
