//! Logger setup for the command line tools.

use env_logger::{Builder, Env};

/// Initialize the global logger. `verbose` selects the `info` level, otherwise only warnings are
/// shown. `RUST_LOG` overrides both. Calling this more than once has no effect.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let _ = Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
