//! Deletion of snapshots that have outlived the retention window.

use tracing::{debug, info};

use crate::clock::Clock;
use crate::retention::RetentionDays;
use crate::storage::StorageClient;

/// Deletes an account's snapshots once they are older than the retention
/// window.
#[derive(Clone, Debug)]
pub struct SnapshotPruner<C, K> {
    client: C,
    clock: K,
}

impl<C: StorageClient, K: Clock> SnapshotPruner<C, K> {
    /// Creates a pruner that talks to `client` and reads time from `clock`.
    #[must_use]
    pub const fn new(client: C, clock: K) -> Self {
        Self { client, clock }
    }

    /// Deletes every snapshot owned by `account_id` whose start time is more
    /// than `retention` whole days in the past, in listing order.
    ///
    /// # Errors
    ///
    /// Returns the client error from the first failing call. Snapshots deleted
    /// before the failure stay deleted.
    pub fn delete_old_snapshots(
        &self,
        account_id: &str,
        retention: RetentionDays,
    ) -> Result<(), C::Error> {
        let snapshots = self.client.list_snapshots(&[account_id.to_owned()])?;
        let mut deleted = 0_usize;
        for snapshot in snapshots
            .iter()
            .filter(|snapshot| self.clock.older_than(snapshot.start_time, retention))
        {
            debug!(
                snapshot_id = %snapshot.snapshot_id,
                start_time = %snapshot.start_time,
                "deleting expired snapshot"
            );
            self.client.delete_snapshot(&snapshot.snapshot_id)?;
            deleted += 1;
        }
        info!(
            account_id,
            %retention,
            scanned = snapshots.len(),
            deleted,
            "snapshot pruning finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests;
