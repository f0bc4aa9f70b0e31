//! Core library for the snapwarden snapshot lifecycle job.
//!
//! Two scheduled operations share a narrow [`StorageClient`] seam: one
//! snapshots every volume tagged `Backup=true`, the other deletes an
//! account's snapshots once they outlive a retention window. The AWS CLI
//! client is the production implementation of that seam.

pub mod aws;
pub mod clock;
pub mod command;
pub mod config;
pub mod creator;
pub mod event;
pub mod handler;
pub mod logging;
pub mod pruner;
pub mod retention;
pub mod storage;
pub mod tags;
pub mod test_support;

pub use aws::{AwsCliClient, AwsCliConfig, AwsCliError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use command::{CommandError, CommandOutput, CommandRunner, ProcessCommandRunner};
pub use config::SnapwardenConfig;
pub use creator::SnapshotCreator;
pub use event::{EventError, TriggerEvent};
pub use handler::HandlerError;
pub use pruner::SnapshotPruner;
pub use retention::RetentionDays;
pub use storage::{CreatedSnapshot, Snapshot, StorageClient, Volume};
pub use tags::{Tag, Tagged, has_true_tag, tag_value};
