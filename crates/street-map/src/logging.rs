/*!
Logging and profiling setup for the street-map binary.

Without the `profiling` feature this installs a plain fmt layer. With it,
`profiling` scopes in the library are emitted as tracing spans and show up
in the same output at the `trace` level.
*/

use tracing_subscriber::prelude::*;

/// Initialize logging with sensible defaults.
///
/// If RUST_LOG is not set, debug builds log at `debug` and release builds at
/// `info`. Logs go to stderr so stdout stays machine-readable.
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    if std::env::var("RUST_LOG").is_err() {
        // Safety: single-threaded at startup
        unsafe {
            if cfg!(debug_assertions) {
                std::env::set_var("RUST_LOG", "debug");
            } else {
                std::env::set_var("RUST_LOG", "info");
            }
        }
    }

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(fmt_layer).init();

    if cfg!(feature = "profiling") {
        tracing::info!("Logging initialized (profiling spans enabled)");
    } else {
        tracing::debug!("Logging initialized (profiling disabled in this build)");
    }
}
