//! Trigger-level entry points.
//!
//! Each handler reads what it needs from the [`TriggerEvent`], wraps the core
//! operation in a tracing span, and reports start and completion. Storage
//! errors are passed through untouched.

use thiserror::Error;
use tracing::{info, info_span};

use crate::clock::Clock;
use crate::creator::SnapshotCreator;
use crate::event::{EventError, TriggerEvent};
use crate::pruner::SnapshotPruner;
use crate::retention::RetentionDays;
use crate::storage::StorageClient;

/// Errors surfaced by the trigger handlers.
#[derive(Clone, Debug, Error)]
pub enum HandlerError<StorageError>
where
    StorageError: std::error::Error + 'static,
{
    /// Raised when the trigger event is missing or has malformed fields.
    #[error(transparent)]
    Event(#[from] EventError),
    /// Raised when the storage provider rejects a call.
    #[error("storage call failed: {0}")]
    Storage(#[source] StorageError),
}

/// Snapshots every volume tagged `Backup=true`.
///
/// The event is accepted for signature parity with the pruner; no fields are
/// read from it.
///
/// # Errors
///
/// Returns [`HandlerError::Storage`] when any provider call fails.
pub fn make_snapshots<C, K>(
    _event: &TriggerEvent,
    client: C,
    clock: K,
) -> Result<(), HandlerError<C::Error>>
where
    C: StorageClient,
    K: Clock,
{
    let span = info_span!("make_snapshots");
    let _entered = span.enter();
    info!("starting snapshot creation");
    SnapshotCreator::new(client, clock)
        .make_snapshots()
        .map_err(HandlerError::Storage)?;
    info!("snapshot creation complete");
    Ok(())
}

/// Deletes the event account's snapshots older than the retention window.
///
/// The window comes from the event's `days` field, falling back to
/// `default_retention` when absent.
///
/// # Errors
///
/// Returns [`HandlerError::Event`] when `account` is missing or either field
/// is malformed, and [`HandlerError::Storage`] when any provider call fails.
pub fn delete_old_snapshots<C, K>(
    event: &TriggerEvent,
    client: C,
    clock: K,
    default_retention: RetentionDays,
) -> Result<(), HandlerError<C::Error>>
where
    C: StorageClient,
    K: Clock,
{
    let account = event.account()?;
    let retention = event.retention_days(default_retention)?;
    let span = info_span!("delete_old_snapshots", account, retention = retention.get());
    let _entered = span.enter();
    info!("starting snapshot pruning");
    SnapshotPruner::new(client, clock)
        .delete_old_snapshots(account, retention)
        .map_err(HandlerError::Storage)?;
    info!("snapshot pruning complete");
    Ok(())
}
