//! Diagnostic log setup for the binary.
//!
//! Library code only emits `tracing` events; this installs the one
//! subscriber, writing to stderr so command output on stdout stays clean.

use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Install the global fmt subscriber using `settings.log_level`.
///
/// An unparsable filter falls back to `warn`. Calling this twice is
/// harmless: the second install is ignored.
pub fn init(settings: &Settings) {
    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
