//! Configuration parser for loading configuration files.
//!
//! This module handles loading configuration from YAML files and environment
//! variables, with environment values taking precedence over the file.

use crate::error::{ConfigError, Result, TagwrightError};
use std::path::Path;
use tracing::{debug, info};

use super::spec::TagwrightConfig;
use crate::reconciler::MutationOrder;
use crate::tags::KeyCase;

/// Configuration parser for loading reconciliation settings.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<std::path::PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<TagwrightConfig> {
        let path = self.resolve(path.as_ref());
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(TagwrightError::Config(ConfigError::FileNotFound { path }));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            TagwrightError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(&path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// An empty document yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<TagwrightConfig> {
        debug!("Parsing YAML configuration");

        if content.trim().is_empty() {
            return Ok(TagwrightConfig::default());
        }

        let config: TagwrightConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            TagwrightError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!(
            "Parsed configuration with {} reserved prefix(es)",
            config.tags.reserved_prefixes.len()
        );
        Ok(config)
    }

    /// Loads configuration with environment variable overrides.
    ///
    /// Environment variables are checked in the format
    /// `TAGWRIGHT_<SECTION>_<KEY>` (e.g., `TAGWRIGHT_DELETE_TIMEOUT_SECS`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an override
    /// holds an invalid value.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<TagwrightConfig> {
        let mut config = self.load_file(path)?;
        Self::apply_overrides(&mut config, |name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Applies overrides looked up through `lookup` to the configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the variable if a value cannot be
    /// parsed.
    pub fn apply_overrides(
        config: &mut TagwrightConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(prefixes) = lookup("TAGWRIGHT_RESERVED_PREFIXES") {
            debug!("Overriding tags.reserved_prefixes from environment");
            config.tags.reserved_prefixes = split_list(&prefixes);
        }

        if let Some(keys) = lookup("TAGWRIGHT_IGNORED_KEYS") {
            debug!("Overriding tags.ignored_keys from environment");
            config.tags.ignored_keys = split_list(&keys);
        }

        if let Some(case) = lookup("TAGWRIGHT_KEY_CASE") {
            debug!("Overriding tags.key_case from environment");
            config.tags.key_case = match case.to_lowercase().as_str() {
                "sensitive" => KeyCase::Sensitive,
                "insensitive" => KeyCase::Insensitive,
                _ => return Err(invalid_override("TAGWRIGHT_KEY_CASE", &case)),
            };
        }

        if let Some(order) = lookup("TAGWRIGHT_MUTATION_ORDER") {
            debug!("Overriding tags.mutation_order from environment");
            config.tags.mutation_order = match order.to_lowercase().as_str() {
                "sequential" => MutationOrder::Sequential,
                "independent" => MutationOrder::Independent,
                _ => return Err(invalid_override("TAGWRIGHT_MUTATION_ORDER", &order)),
            };
        }

        if let Some(secs) = lookup("TAGWRIGHT_CREATE_TIMEOUT_SECS") {
            debug!("Overriding waiters.create.timeout_secs from environment");
            config.waiters.create.timeout_secs = parse_u64("TAGWRIGHT_CREATE_TIMEOUT_SECS", &secs)?;
        }

        if let Some(secs) = lookup("TAGWRIGHT_DELETE_TIMEOUT_SECS") {
            debug!("Overriding waiters.delete.timeout_secs from environment");
            config.waiters.delete.timeout_secs = parse_u64("TAGWRIGHT_DELETE_TIMEOUT_SECS", &secs)?;
        }

        Ok(())
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| std::path::PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                TagwrightError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    fn resolve(&self, path: &Path) -> std::path::PathBuf {
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_u64(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid_override(name, value))
}

fn invalid_override(name: &str, value: &str) -> TagwrightError {
    TagwrightError::Config(ConfigError::validation(
        format!("invalid value '{value}' for {name}"),
        name,
    ))
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["tagwright.yaml", "tagwright.yml"];

/// Finds the configuration file in the current directory or parent directories.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<std::path::PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(TagwrightError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_empty_config() {
        let parser = ConfigParser::new();
        let config = parser.parse_yaml("", None).unwrap();
        assert_eq!(config, TagwrightConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
tags:
  reserved_prefixes: ["aws:", "kubernetes.io/"]
  ignored_keys: [Owner]
  key_case: insensitive
  mutation_order: independent
waiters:
  create:
    interval_ms: 500
    timeout_secs: 120
  delete:
    interval_ms: 2000
    multiplier: 1.5
    max_interval_ms: 30000
    timeout_secs: 1800
"#;
        let parser = ConfigParser::new();
        let config = parser.parse_yaml(yaml, None).unwrap();

        assert_eq!(config.tags.reserved_prefixes.len(), 2);
        assert_eq!(config.tags.ignored_keys, vec!["Owner".to_string()]);
        assert_eq!(config.tags.key_case, KeyCase::Insensitive);
        assert_eq!(config.tags.mutation_order, MutationOrder::Independent);
        assert_eq!(config.waiters.create.interval_ms, 500);
        assert_eq!(config.waiters.create.timeout_secs, 120);
        assert_eq!(config.waiters.create.not_found_grace_secs, 20);
        assert_eq!(config.waiters.delete.max_interval_ms, 30000);
    }

    #[test]
    fn test_invalid_yaml_reports_location() {
        let parser = ConfigParser::new();
        let err = parser
            .parse_yaml("tags: [", Some(Path::new("tagwright.yaml")))
            .unwrap_err();
        match err {
            TagwrightError::Config(ConfigError::ParseError { location, .. }) => {
                assert_eq!(location.as_deref(), Some("tagwright.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overrides_take_precedence() {
        let vars: HashMap<&str, &str> = [
            ("TAGWRIGHT_RESERVED_PREFIXES", "aws:, internal:"),
            ("TAGWRIGHT_KEY_CASE", "Insensitive"),
            ("TAGWRIGHT_DELETE_TIMEOUT_SECS", "60"),
        ]
        .into_iter()
        .collect();

        let mut config = TagwrightConfig::default();
        ConfigParser::apply_overrides(&mut config, |name| vars.get(name).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(
            config.tags.reserved_prefixes,
            vec!["aws:".to_string(), "internal:".to_string()]
        );
        assert_eq!(config.tags.key_case, KeyCase::Insensitive);
        assert_eq!(config.waiters.delete.timeout_secs, 60);
        assert_eq!(config.waiters.create.timeout_secs, 600);
    }

    #[test]
    fn test_invalid_override_names_variable() {
        let mut config = TagwrightConfig::default();
        let err = ConfigParser::apply_overrides(&mut config, |name| {
            (name == "TAGWRIGHT_CREATE_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("TAGWRIGHT_CREATE_TIMEOUT_SECS"));
    }

    #[test]
    fn test_load_file_and_find_config() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            dir.path().join("tagwright.yaml"),
            "tags:\n  ignored_keys: [Owner]\n",
        )
        .unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dir.path().join("tagwright.yaml"));

        let config = ConfigParser::new()
            .with_base_path(dir.path())
            .load_file("tagwright.yaml")
            .unwrap();
        assert_eq!(config.tags.ignored_keys, vec!["Owner".to_string()]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigParser::new()
            .load_file(dir.path().join("absent.yaml"))
            .unwrap_err();
        assert!(matches!(
            err,
            TagwrightError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let parser = ConfigParser::new().with_base_path(dir.path());
        assert!(parser.load_dotenv().is_ok());
    }
}
