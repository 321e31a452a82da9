//! Diagnostics for the CLI.
//!
//! Engine events (`Log` actions, guard and delay traces) go to stderr so
//! stdout stays clean JSON for piping.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset, which is enough to show
/// `log` actions from spec files.
///
/// ```bash
/// RUST_LOG=casewise=debug casewise check user.json --spec user.yaml
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
