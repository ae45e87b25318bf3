//! Logging setup.
//!
//! Logs go to stderr so stdout stays clean for command output. The filter is
//! read from `SURVEY_LOG` (same syntax as `RUST_LOG`) and defaults to `warn`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "SURVEY_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install the global tracing subscriber.
pub fn init(json: bool) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed (tests); keep the existing one
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
