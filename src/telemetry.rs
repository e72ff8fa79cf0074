//! Diagnostic logging.
//!
//! Controlled by `BITLET_LOG`:
//! - unset or empty → no subscriber, command output stays untouched
//! - any other value → used as an `EnvFilter` directive (e.g. `debug`,
//!   `bitlet::artifacts::merge=trace`), events go to stderr

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "BITLET_LOG";

/// Install the global subscriber if `BITLET_LOG` asks for one.
pub fn init() {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    match std::env::var(LOG_ENV) {
        Ok(directive) if !directive.trim().is_empty() => {}
        _ => return,
    }

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    // keeps an already installed subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init();
}
