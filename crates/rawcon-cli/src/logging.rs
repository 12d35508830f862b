use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_ENV: &str = "RAWCON_LOG";

/// Filter used when `RAWCON_LOG` is unset or invalid.
pub const fn default_directives(verbose: bool) -> &'static str {
    if verbose { "rawcon=debug" } else { "warn" }
}

/// Install the stderr subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(default_directives(true))
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| default_directives(false).into())
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .try_init();
}
