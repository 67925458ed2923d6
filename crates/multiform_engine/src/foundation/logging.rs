//! Logging utilities

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Call once from a binary's `main`. The library itself only emits log
/// records and never installs a logger.
pub fn init() {
    env_logger::init();
}

/// Initialize logging for a test run
///
/// Safe to call from multiple tests; only the first call installs the
/// logger.
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
