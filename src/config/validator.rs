//! Configuration validation.
//!
//! Checks a loaded configuration before any reconciliation runs, collecting
//! every problem and warning in one pass.

use crate::error::{ConfigError, Result, TagwrightError};
use std::collections::HashSet;
use tracing::{debug, warn};

use super::spec::{TagsConfig, TagwrightConfig, WaiterSettings};

/// Validator for reconciliation configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns the first error found if validation fails.
    pub fn validate(&self, config: &TagwrightConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_tags(&config.tags, &mut result);
        Self::validate_waiter(&config.waiters.create, "waiters.create", &mut result);
        Self::validate_waiter(&config.waiters.delete, "waiters.delete", &mut result);

        for warning in &result.warnings {
            warn!("{warning}");
        }

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(TagwrightError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        }
    }

    fn validate_tags(tags: &TagsConfig, result: &mut ValidationResult) {
        if tags.reserved_prefixes.is_empty() {
            result.warnings.push(String::from(
                "tags.reserved_prefixes: no reserved prefixes, platform-owned tags may be removed",
            ));
        }

        for (i, prefix) in tags.reserved_prefixes.iter().enumerate() {
            if prefix.is_empty() {
                result.errors.push(ValidationError {
                    field: format!("tags.reserved_prefixes[{i}]"),
                    message: String::from("Reserved prefix cannot be empty"),
                });
            }
        }

        let mut seen = HashSet::new();
        for (i, key) in tags.ignored_keys.iter().enumerate() {
            if key.is_empty() {
                result.errors.push(ValidationError {
                    field: format!("tags.ignored_keys[{i}]"),
                    message: String::from("Ignored key cannot be empty"),
                });
            } else if !seen.insert(key) {
                result
                    .warnings
                    .push(format!("tags.ignored_keys[{i}]: duplicate key '{key}'"));
            }
        }
    }

    fn validate_waiter(settings: &WaiterSettings, prefix: &str, result: &mut ValidationResult) {
        if settings.interval_ms == 0 {
            result.errors.push(ValidationError {
                field: format!("{prefix}.interval_ms"),
                message: String::from("Polling interval must be greater than zero"),
            });
        }

        if !settings.multiplier.is_finite() || settings.multiplier < 1.0 {
            result.errors.push(ValidationError {
                field: format!("{prefix}.multiplier"),
                message: format!(
                    "Backoff multiplier must be at least 1, got {}",
                    settings.multiplier
                ),
            });
        }

        if settings.max_interval_ms < settings.interval_ms {
            result.errors.push(ValidationError {
                field: format!("{prefix}.max_interval_ms"),
                message: String::from("Maximum interval cannot be below the polling interval"),
            });
        }

        if settings.timeout_secs.saturating_mul(1000) <= settings.interval_ms {
            result.errors.push(ValidationError {
                field: format!("{prefix}.timeout_secs"),
                message: String::from("Timeout must exceed the polling interval"),
            });
        }

        if settings.initial_delay_ms >= settings.timeout_secs.saturating_mul(1000) {
            result.warnings.push(format!(
                "{prefix}.initial_delay_ms: initial delay leaves no time to poll"
            ));
        }
    }
}
