//! Logging setup

use tracing_subscriber::{EnvFilter, fmt};

/// Picks the default filter directive from the `verbose` and `debug` flags
pub fn default_directive(verbose: bool, debug: bool) -> &'static str {
    if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    }
}

/// Installs the subscriber right away when `RUST_LOG` is set
///
/// Returns `Ok(false)` without installing anything when `RUST_LOG` is absent
/// or unparsable, leaving the choice to [`init_logging`] once flags are known.
pub fn init_from_env() -> Result<bool, String> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => install(filter).map(|()| true),
        Err(_) => Ok(false),
    }
}

/// Initializes the global subscriber, writing to stderr
///
/// `RUST_LOG` takes precedence over `directive`.
pub fn init_logging(directive: &str) -> Result<(), String> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    install(filter)
}

fn install(filter: EnvFilter) -> Result<(), String> {
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| format!("Log system initialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false), "warn");
        assert_eq!(default_directive(true, false), "info");
        assert_eq!(default_directive(false, true), "debug");
        assert_eq!(default_directive(true, true), "debug");
    }
}
