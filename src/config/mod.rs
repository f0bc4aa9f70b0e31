//! Configuration loading via `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::aws::{AwsCliConfig, DEFAULT_AWS_BIN};
use crate::retention::RetentionDays;

/// Snapwarden configuration derived from defaults, configuration files, and
/// environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "SNAPWARDEN")]
pub struct SnapwardenConfig {
    /// Path to the AWS CLI binary. Defaults to `aws` on `PATH`.
    #[ortho_config(default = DEFAULT_AWS_BIN.to_owned())]
    pub aws_bin: String,
    /// AWS region. When unset the CLI resolves it from its own configuration.
    pub region: Option<String>,
    /// Named AWS CLI profile.
    pub profile: Option<String>,
    /// Retention window used when the trigger event carries no `days` field.
    #[ortho_config(default = 30)]
    pub retention_days: u32,
    /// `tracing` filter directive applied when `RUST_LOG` is unset.
    #[ortho_config(default = "info".to_owned())]
    pub log_filter: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[ortho_config(default = false)]
    pub json_logs: bool,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "{} is blank: set {} or add {} to snapwarden.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

const AWS_BIN: FieldMetadata =
    FieldMetadata::new("AWS CLI binary", "SNAPWARDEN_AWS_BIN", "aws_bin");
const REGION: FieldMetadata = FieldMetadata::new("AWS region", "SNAPWARDEN_REGION", "region");
const PROFILE: FieldMetadata =
    FieldMetadata::new("AWS CLI profile", "SNAPWARDEN_PROFILE", "profile");
const LOG_FILTER: FieldMetadata =
    FieldMetadata::new("log filter", "SNAPWARDEN_LOG_FILTER", "log_filter");

impl SnapwardenConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(metadata.missing());
        }
        Ok(())
    }

    fn require_optional(value: Option<&str>, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        value.map_or(Ok(()), |present| Self::require_field(present, metadata))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("snapwarden")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and configuration key to set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty or
    /// an optional field is present but blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(&self.aws_bin, &AWS_BIN)?;
        Self::require_optional(self.region.as_deref(), &REGION)?;
        Self::require_optional(self.profile.as_deref(), &PROFILE)?;
        Self::require_field(&self.log_filter, &LOG_FILTER)?;
        Ok(())
    }

    /// Builds the AWS CLI settings from this configuration. Call
    /// [`SnapwardenConfig::validate`] first for actionable messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the AWS CLI settings are rejected.
    pub fn aws_cli_config(&self) -> Result<AwsCliConfig, ConfigError> {
        AwsCliConfig::new(&self.aws_bin, self.region.clone(), self.profile.clone())
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Returns the retention window applied when an event has no `days`.
    #[must_use]
    pub const fn default_retention(&self) -> RetentionDays {
        RetentionDays::new(self.retention_days)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
