//! Configuration module for the reconciliation core.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `tagwright.yaml`
//! - Environment variable overrides
//! - Validation of configuration values

mod parser;
mod spec;
mod validator;

pub use parser::{ConfigParser, DEFAULT_CONFIG_FILES, find_config_file};
pub use spec::{TagsConfig, TagwrightConfig, WaiterSettings, WaitersConfig};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
