//! Tracing setup for the `getup` binary.
//!
//! Engine logs (lifecycle changes, saved sessions, skipped frames) go to
//! stderr so replay output on stdout stays readable. `RUST_LOG` replaces the
//! default filter entirely.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Targets shown at the chosen level; everything else stays at `warn`
const GETUP_TARGETS: [&str; 2] = ["getup_core", "getup"];

/// Log our own crates at INFO
pub fn init() {
    init_with_level("info")
}

/// Filter directives used when `RUST_LOG` is unset
pub fn default_directives(level: &str) -> String {
    GETUP_TARGETS
        .iter()
        .fold(String::from("warn"), |directives, target| {
            format!("{},{}={}", directives, target, level)
        })
}

pub fn init_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new(default_directives("debug")))
        .try_init();
}
