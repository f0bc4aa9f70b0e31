//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::command::{CommandError, CommandOutput, CommandRunner};
use crate::storage::{CreatedSnapshot, Snapshot, StorageClient, Volume};
use crate::tags::Tag;

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive deterministic command outcomes without spawning processes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<CommandOutput>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }

    /// Returns the argument following `flag`, if any.
    #[must_use]
    pub fn flag_value(&self, flag: &str) -> Option<String> {
        self.args
            .iter()
            .skip_while(|arg| arg.to_string_lossy() != flag)
            .nth(1)
            .map(|arg| arg.to_string_lossy().into_owned())
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Pushes a successful exit status with empty output.
    pub fn push_success(&self) {
        self.push_output(Some(0), "", "");
    }

    /// Pushes a failing exit code with stderr text.
    pub fn push_failure(&self, code: i32, stderr: impl Into<String>) {
        self.push_output(Some(code), "", stderr);
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, CommandError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| CommandError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// Storage operations recorded by [`MemoryStorage`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StorageOperation {
    /// `list_volumes`.
    ListVolumes,
    /// `create_snapshot`.
    CreateSnapshot,
    /// `tag_resource`.
    TagResource,
    /// `list_snapshots`.
    ListSnapshots,
    /// `delete_snapshot`.
    DeleteSnapshot,
}

/// A single call made against [`MemoryStorage`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StorageCall {
    /// Volumes were listed.
    ListVolumes,
    /// A snapshot was requested.
    CreateSnapshot {
        /// Volume being snapshotted.
        volume_id: String,
        /// Description sent with the request.
        description: String,
    },
    /// Tags were applied to a resource.
    TagResource {
        /// Tagged resource.
        resource_id: String,
        /// Tags applied.
        tags: Vec<Tag>,
    },
    /// Snapshots were listed for the given owners.
    ListSnapshots {
        /// Owner filter.
        owner_ids: Vec<String>,
    },
    /// A snapshot was deleted.
    DeleteSnapshot {
        /// Deleted snapshot.
        snapshot_id: String,
    },
}

impl StorageCall {
    const fn operation(&self) -> StorageOperation {
        match self {
            Self::ListVolumes => StorageOperation::ListVolumes,
            Self::CreateSnapshot { .. } => StorageOperation::CreateSnapshot,
            Self::TagResource { .. } => StorageOperation::TagResource,
            Self::ListSnapshots { .. } => StorageOperation::ListSnapshots,
            Self::DeleteSnapshot { .. } => StorageOperation::DeleteSnapshot,
        }
    }
}

/// Error returned by [`MemoryStorage`] when a failure was scripted.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("scripted {operation:?} failure on call {occurrence}")]
pub struct MemoryStorageError {
    /// Operation that failed.
    pub operation: StorageOperation,
    /// One-based call count of that operation.
    pub occurrence: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    volumes: Vec<Volume>,
    snapshots: Vec<(String, Snapshot)>,
    calls: Vec<StorageCall>,
    failures: Vec<(StorageOperation, usize)>,
}

/// In-memory [`StorageClient`] that records every call.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect calls through another.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a volume to the listing.
    pub fn add_volume(&self, volume: Volume) {
        self.state.borrow_mut().volumes.push(volume);
    }

    /// Adds a snapshot owned by `owner_id`.
    pub fn add_snapshot(&self, owner_id: impl Into<String>, snapshot: Snapshot) {
        self.state
            .borrow_mut()
            .snapshots
            .push((owner_id.into(), snapshot));
    }

    /// Makes the `occurrence`-th (one-based) call of `operation` fail.
    pub fn fail_on(&self, operation: StorageOperation, occurrence: usize) {
        self.state
            .borrow_mut()
            .failures
            .push((operation, occurrence));
    }

    /// Returns every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<StorageCall> {
        self.state.borrow().calls.clone()
    }

    /// Returns the identifiers of snapshots still present.
    #[must_use]
    pub fn snapshot_ids(&self) -> Vec<String> {
        self.state
            .borrow()
            .snapshots
            .iter()
            .map(|(_, snapshot)| snapshot.snapshot_id.clone())
            .collect()
    }

    /// Returns the identifiers passed to `delete_snapshot`, in call order.
    #[must_use]
    pub fn deleted_snapshot_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StorageCall::DeleteSnapshot { snapshot_id } => Some(snapshot_id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: StorageCall) -> Result<usize, MemoryStorageError> {
        let mut state = self.state.borrow_mut();
        let operation = call.operation();
        state.calls.push(call);
        let occurrence = state
            .calls
            .iter()
            .filter(|recorded| recorded.operation() == operation)
            .count();
        if state.failures.contains(&(operation, occurrence)) {
            return Err(MemoryStorageError {
                operation,
                occurrence,
            });
        }
        Ok(occurrence)
    }
}

impl StorageClient for MemoryStorage {
    type Error = MemoryStorageError;

    fn list_volumes(&self) -> Result<Vec<Volume>, Self::Error> {
        self.record(StorageCall::ListVolumes)?;
        Ok(self.state.borrow().volumes.clone())
    }

    fn create_snapshot(
        &self,
        volume_id: &str,
        description: &str,
    ) -> Result<CreatedSnapshot, Self::Error> {
        let occurrence = self.record(StorageCall::CreateSnapshot {
            volume_id: volume_id.to_owned(),
            description: description.to_owned(),
        })?;
        Ok(CreatedSnapshot {
            snapshot_id: format!("snap-{occurrence}"),
        })
    }

    fn tag_resource(&self, resource_id: &str, tags: &[Tag]) -> Result<(), Self::Error> {
        self.record(StorageCall::TagResource {
            resource_id: resource_id.to_owned(),
            tags: tags.to_vec(),
        })?;
        Ok(())
    }

    fn list_snapshots(&self, owner_ids: &[String]) -> Result<Vec<Snapshot>, Self::Error> {
        self.record(StorageCall::ListSnapshots {
            owner_ids: owner_ids.to_vec(),
        })?;
        Ok(self
            .state
            .borrow()
            .snapshots
            .iter()
            .filter(|(owner, _)| owner_ids.contains(owner))
            .map(|(_, snapshot)| snapshot.clone())
            .collect())
    }

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), Self::Error> {
        self.record(StorageCall::DeleteSnapshot {
            snapshot_id: snapshot_id.to_owned(),
        })?;
        self.state
            .borrow_mut()
            .snapshots
            .retain(|(_, snapshot)| snapshot.snapshot_id != snapshot_id);
        Ok(())
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets `set` and removes `unset` while holding a global mutex.
    #[must_use]
    pub fn set_vars(set: &[(&str, &str)], unset: &[&str]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                set.iter()
                    .map(|(key, _)| *key)
                    .chain(unset.iter().copied())
                    .all(|key| seen.insert(key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut previous = Vec::with_capacity(set.len() + unset.len());
        for (key, value) in set {
            previous.push(((*key).to_owned(), env::var_os(key)));
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`.
            unsafe { env::set_var(key, value) };
        }
        for key in unset {
            previous.push(((*key).to_owned(), env::var_os(key)));
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`.
            unsafe { env::remove_var(key) };
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

/// Builds a volume carrying the given `(key, value)` tags.
#[must_use]
pub fn tagged_volume(volume_id: &str, tags: &[(&str, &str)]) -> Volume {
    Volume::new(
        volume_id,
        Some(
            tags.iter()
                .map(|(key, value)| Tag::new(*key, *value))
                .collect(),
        ),
    )
}

/// Produces a payload matching `aws ec2 describe-volumes --output json`.
#[must_use]
pub fn json_volumes(volumes: &[(&str, &[(&str, &str)])]) -> String {
    let items = volumes
        .iter()
        .map(|(id, tags)| {
            let tag_list = tags
                .iter()
                .map(|(key, value)| serde_json::json!({ "Key": key, "Value": value }))
                .collect::<Vec<_>>();
            serde_json::json!({ "VolumeId": id, "State": "in-use", "Tags": tag_list })
        })
        .collect::<Vec<_>>();
    serde_json::json!({ "Volumes": items }).to_string()
}

/// Produces a payload matching `aws ec2 describe-snapshots --output json`.
#[must_use]
pub fn json_snapshots(snapshots: &[(&str, DateTime<Utc>)]) -> String {
    let items = snapshots
        .iter()
        .map(|(id, start)| {
            serde_json::json!({
                "SnapshotId": id,
                "StartTime": start.to_rfc3339_opts(SecondsFormat::Millis, true),
                "State": "completed",
            })
        })
        .collect::<Vec<_>>();
    serde_json::json!({ "Snapshots": items }).to_string()
}

/// Produces a payload matching `aws ec2 create-snapshot --output json`.
#[must_use]
pub fn json_created_snapshot(snapshot_id: &str) -> String {
    serde_json::json!({ "SnapshotId": snapshot_id, "State": "pending" }).to_string()
}
