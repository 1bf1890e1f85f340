//! Public surface for infraspec.
//!
//! Re-exports the resolution crate and provides the logging and command-line
//! helpers shared by the `infraspec` binary.

pub mod cli;

/// Re-export for convenience.
pub use infraspec_config as config;
pub use infraspec_config::{ConfigError, InfrastructureSpec, get_infrastructure_info};

/// Variable holding the log filter, e.g. `debug` or `infraspec_config=trace`.
pub const LOG_LEVEL_VARIABLE: &str = "LOG_LEVEL";

#[inline]
/// Initialize logging using env_logger.
///
/// The filter is read from `LOG_LEVEL` and defaults to `info`. Calling this
/// more than once is harmless.
pub fn init_logging() {
    let env = env_logger::Env::default().filter_or(LOG_LEVEL_VARIABLE, "info");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
