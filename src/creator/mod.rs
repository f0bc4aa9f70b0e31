//! Snapshot creation for volumes tagged for backup.

use tracing::{debug, info};

use crate::clock::Clock;
use crate::storage::{StorageClient, Volume};
use crate::tags::{BACKUP_TAG, NAME_TAG, Tag, has_true_tag, tag_value};

/// Creates and names snapshots for every volume tagged `Backup=true`.
#[derive(Clone, Debug)]
pub struct SnapshotCreator<C, K> {
    client: C,
    clock: K,
}

impl<C: StorageClient, K: Clock> SnapshotCreator<C, K> {
    /// Creates a creator that talks to `client` and reads time from `clock`.
    #[must_use]
    pub const fn new(client: C, clock: K) -> Self {
        Self { client, clock }
    }

    /// Snapshots every backup-tagged volume in the order the provider lists
    /// them, then tags each new snapshot with a timestamped `Name`.
    ///
    /// # Errors
    ///
    /// Returns the client error from the first failing call. Snapshots made
    /// before the failure are left in place.
    pub fn make_snapshots(&self) -> Result<(), C::Error> {
        let volumes = self.client.list_volumes()?;
        let mut created = 0_usize;
        for volume in volumes
            .iter()
            .filter(|volume| has_true_tag(BACKUP_TAG, *volume))
        {
            let description = volume_description(volume);
            let snapshot = self
                .client
                .create_snapshot(&volume.volume_id, &description)?;
            let name = snapshot_name(volume, &self.clock.timestamp());
            debug!(
                volume_id = %volume.volume_id,
                snapshot_id = %snapshot.snapshot_id,
                %name,
                "snapshot requested"
            );
            self.client
                .tag_resource(&snapshot.snapshot_id, &[Tag::new(NAME_TAG, name)])?;
            created += 1;
        }
        info!(scanned = volumes.len(), created, "snapshot creation finished");
        Ok(())
    }
}

/// Returns the volume's non-empty `Name` tag, falling back to its identifier.
fn display_name(volume: &Volume) -> &str {
    let name = tag_value(NAME_TAG, volume.tags.as_deref());
    if name.is_empty() {
        &volume.volume_id
    } else {
        name
    }
}

/// Builds the snapshot description, `Backup of <name or id>`.
#[must_use]
pub fn volume_description(volume: &Volume) -> String {
    format!("Backup of {}", display_name(volume))
}

/// Builds the snapshot `Name` tag value, `<name or id> <timestamp>`.
#[must_use]
pub fn snapshot_name(volume: &Volume, timestamp: &str) -> String {
    format!("{} {timestamp}", display_name(volume))
}
