//! AWS CLI-backed storage client.
//!
//! Every [`StorageClient`] call shells out to `aws ec2 ...` and parses the
//! JSON it prints. The CLI's default auto-pagination is relied upon; no
//! retries are attempted here.

use std::ffi::OsString;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::command::{CommandError, CommandOutput, CommandRunner, ProcessCommandRunner};
use crate::storage::{CreatedSnapshot, Snapshot, StorageClient, Volume};
use crate::tags::Tag;

/// Default AWS CLI binary name.
pub const DEFAULT_AWS_BIN: &str = "aws";

/// Settings for invoking the AWS CLI.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AwsCliConfig {
    /// Path to the `aws` CLI binary.
    pub aws_bin: String,
    /// Region passed as `--region`; the CLI's own resolution applies when unset.
    pub region: Option<String>,
    /// Named profile passed as `--profile`.
    pub profile: Option<String>,
}

impl AwsCliConfig {
    /// Constructs a config, trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`AwsCliError::InvalidConfig`] when `aws_bin` is blank or an
    /// optional value is present but blank.
    pub fn new(
        aws_bin: impl Into<String>,
        region: Option<String>,
        profile: Option<String>,
    ) -> Result<Self, AwsCliError> {
        let trimmed_aws_bin = aws_bin.into().trim().to_owned();
        if trimmed_aws_bin.is_empty() {
            return Err(AwsCliError::InvalidConfig {
                field: String::from("aws_bin"),
            });
        }
        Ok(Self {
            aws_bin: trimmed_aws_bin,
            region: trim_optional(region, "region")?,
            profile: trim_optional(profile, "profile")?,
        })
    }
}

fn trim_optional(value: Option<String>, field: &str) -> Result<Option<String>, AwsCliError> {
    value
        .map(|raw| {
            let trimmed = raw.trim().to_owned();
            if trimmed.is_empty() {
                Err(AwsCliError::InvalidConfig {
                    field: field.to_owned(),
                })
            } else {
                Ok(trimmed)
            }
        })
        .transpose()
}

/// Errors returned by the AWS CLI client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AwsCliError {
    /// Raised when configuration is missing required values.
    #[error("missing {field}")]
    InvalidConfig {
        /// Name of the missing or invalid field.
        field: String,
    },
    /// Raised when `aws` returns a non-zero exit status.
    #[error("{program} exited with status {status_text}: {stderr}")]
    CommandFailure {
        /// Program that failed (typically `aws`).
        program: String,
        /// Exit status reported by the OS.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Stderr captured from the command.
        stderr: String,
    },
    /// Raised when JSON output from the CLI cannot be parsed.
    #[error("failed to parse {resource} output: {message}")]
    Parse {
        /// Resource type being parsed (for example `volumes`).
        resource: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when command execution fails.
    #[error(transparent)]
    Runner(#[from] CommandError),
}

/// [`StorageClient`] that drives `aws ec2` through a [`CommandRunner`].
#[derive(Clone, Debug)]
pub struct AwsCliClient<R: CommandRunner> {
    config: AwsCliConfig,
    runner: R,
}

impl AwsCliClient<ProcessCommandRunner> {
    /// Creates a client wired to the real process runner.
    #[must_use]
    pub const fn with_process_runner(config: AwsCliConfig) -> Self {
        Self::new(config, ProcessCommandRunner)
    }
}

impl<R: CommandRunner> AwsCliClient<R> {
    /// Creates a new client using the provided configuration and runner.
    #[must_use]
    pub const fn new(config: AwsCliConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Checks command output and converts failure to `AwsCliError`.
    fn check_output(
        &self,
        output: CommandOutput,
        operation: &str,
    ) -> Result<CommandOutput, AwsCliError> {
        if output.is_success() {
            return Ok(output);
        }

        let status_text = output
            .code
            .map_or_else(|| String::from("unknown"), |code| code.to_string());
        Err(AwsCliError::CommandFailure {
            program: self.config.aws_bin.clone(),
            status: output.code,
            status_text,
            stderr: format!("{operation}: {}", output.stderr.trim_end()),
        })
    }

    /// Builds `ec2 <subcommand> <args...>` followed by the global options.
    fn build_args(&self, subcommand: &str, args: Vec<OsString>, json: bool) -> Vec<OsString> {
        let mut full = Vec::with_capacity(args.len() + 7);
        full.push(OsString::from("ec2"));
        full.push(OsString::from(subcommand));
        full.extend(args);

        if let Some(region) = &self.config.region {
            full.push(OsString::from("--region"));
            full.push(OsString::from(region));
        }
        if let Some(profile) = &self.config.profile {
            full.push(OsString::from("--profile"));
            full.push(OsString::from(profile));
        }
        if json {
            full.push(OsString::from("--output"));
            full.push(OsString::from("json"));
        }

        full
    }

    fn run_aws(&self, args: &[OsString], operation: &str) -> Result<CommandOutput, AwsCliError> {
        let output = self.runner.run(&self.config.aws_bin, args)?;
        self.check_output(output, operation)
    }

    fn run_aws_json<T>(&self, args: &[OsString], resource: &str) -> Result<T, AwsCliError>
    where
        T: DeserializeOwned,
    {
        let output = self.run_aws(args, resource)?;
        serde_json::from_str::<T>(&output.stdout).map_err(|err| AwsCliError::Parse {
            resource: resource.to_owned(),
            message: err.to_string(),
        })
    }
}

impl<R: CommandRunner> StorageClient for AwsCliClient<R> {
    type Error = AwsCliError;

    fn list_volumes(&self) -> Result<Vec<Volume>, Self::Error> {
        let args = self.build_args("describe-volumes", Vec::new(), true);
        let page: VolumePage = self.run_aws_json(&args, "volumes")?;
        Ok(page.volumes)
    }

    fn create_snapshot(
        &self,
        volume_id: &str,
        description: &str,
    ) -> Result<CreatedSnapshot, Self::Error> {
        let args = self.build_args(
            "create-snapshot",
            vec![
                OsString::from("--volume-id"),
                OsString::from(volume_id),
                OsString::from("--description"),
                OsString::from(description),
            ],
            true,
        );
        self.run_aws_json(&args, "create-snapshot")
    }

    fn tag_resource(&self, resource_id: &str, tags: &[Tag]) -> Result<(), Self::Error> {
        let tag_json = serde_json::to_string(tags).map_err(|err| AwsCliError::Parse {
            resource: String::from("tags"),
            message: err.to_string(),
        })?;
        let args = self.build_args(
            "create-tags",
            vec![
                OsString::from("--resources"),
                OsString::from(resource_id),
                OsString::from("--tags"),
                OsString::from(tag_json),
            ],
            false,
        );
        self.run_aws(&args, "create-tags").map(drop)
    }

    fn list_snapshots(&self, owner_ids: &[String]) -> Result<Vec<Snapshot>, Self::Error> {
        let mut filters = vec![OsString::from("--owner-ids")];
        filters.extend(owner_ids.iter().map(OsString::from));
        let args = self.build_args("describe-snapshots", filters, true);
        let page: SnapshotPage = self.run_aws_json(&args, "snapshots")?;
        Ok(page.snapshots)
    }

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), Self::Error> {
        let args = self.build_args(
            "delete-snapshot",
            vec![OsString::from("--snapshot-id"), OsString::from(snapshot_id)],
            false,
        );
        self.run_aws(&args, "delete-snapshot").map(drop)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VolumePage {
    volumes: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SnapshotPage {
    snapshots: Vec<Snapshot>,
}
