//! Log output for `airq`.
//!
//! Command results go to stdout and log lines go to stderr, so
//! `airq --json evaluate reading.json > out.json` captures clean JSON while
//! structured events stay visible on the terminal.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber writing to stderr.
///
/// `RUST_LOG` overrides `level`. `json` switches each line to a JSON object
/// carrying the `event` field set by [`crate::obs`]. A subscriber installed
/// earlier (by a host application or a previous call) is left in place.
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry.with(stderr_layer.json()).try_init()
    } else {
        registry.with(stderr_layer).try_init()
    };
    if installed.is_err() {
        tracing::debug!(event = "telemetry.already_installed");
    }
}
