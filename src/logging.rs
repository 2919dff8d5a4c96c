//! Logging setup.
//!
//! The library only emits `tracing` events; binaries and tests that want to
//! see them install a subscriber through [`init_logging`].

use tracing_subscriber::EnvFilter;

use crate::error::{ConfigError, Result, TagwrightError};

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over the `verbose` flag. With `json` set,
/// events are written as one JSON object per line.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber is
/// already installed.
pub fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| logging_error(&e))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if json {
        builder.json().try_init().map_err(|e| logging_error(&e))
    } else {
        builder.try_init().map_err(|e| logging_error(&e))
    }
}

fn logging_error(e: &dyn std::fmt::Display) -> TagwrightError {
    TagwrightError::Config(ConfigError::Logging {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // Another test may already have installed a subscriber.
        let _ = init_logging(false, false);
        let err = init_logging(true, false).unwrap_err();
        assert!(err.to_string().contains("logging"));
    }
}
