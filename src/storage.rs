//! Storage client abstraction over the cloud block-storage API.
//!
//! Volumes and snapshots deserialise straight from EC2 JSON so every client
//! shares one data model.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::tags::{Tag, Tagged};

/// Block-storage volume as reported by the provider.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Volume {
    /// Provider identifier (for example `vol-0abc`).
    pub volume_id: String,
    /// Tags attached to the volume; absent when the volume was never tagged.
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
}

impl Volume {
    /// Creates a volume record with the given tags.
    #[must_use]
    pub fn new(volume_id: impl Into<String>, tags: Option<Vec<Tag>>) -> Self {
        Self {
            volume_id: volume_id.into(),
            tags,
        }
    }
}

impl Tagged for Volume {
    fn tags(&self) -> Option<&[Tag]> {
        self.tags.as_deref()
    }
}

/// Existing snapshot as reported by the provider.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Snapshot {
    /// Provider identifier (for example `snap-0abc`).
    pub snapshot_id: String,
    /// Instant the snapshot was started, normalised to UTC.
    pub start_time: DateTime<Utc>,
}

impl Snapshot {
    /// Creates a snapshot record.
    #[must_use]
    pub fn new(snapshot_id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            snapshot_id: snapshot_id.into(),
            start_time,
        }
    }
}

/// Handle returned once a snapshot request has been accepted.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CreatedSnapshot {
    /// Identifier of the new snapshot.
    pub snapshot_id: String,
}

/// Operations the snapshot jobs need from the storage provider.
///
/// Implementations must not retry; errors are surfaced to the caller as-is.
pub trait StorageClient {
    /// Provider specific error type returned by the client.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Lists every volume visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns the provider error when the listing fails.
    fn list_volumes(&self) -> Result<Vec<Volume>, Self::Error>;

    /// Requests a snapshot of `volume_id` with the given description.
    ///
    /// # Errors
    ///
    /// Returns the provider error when the request is rejected.
    fn create_snapshot(
        &self,
        volume_id: &str,
        description: &str,
    ) -> Result<CreatedSnapshot, Self::Error>;

    /// Applies `tags` to the resource identified by `resource_id`.
    ///
    /// # Errors
    ///
    /// Returns the provider error when tagging fails.
    fn tag_resource(&self, resource_id: &str, tags: &[Tag]) -> Result<(), Self::Error>;

    /// Lists snapshots owned by any of `owner_ids`.
    ///
    /// # Errors
    ///
    /// Returns the provider error when the listing fails.
    fn list_snapshots(&self, owner_ids: &[String]) -> Result<Vec<Snapshot>, Self::Error>;

    /// Deletes the snapshot identified by `snapshot_id`.
    ///
    /// # Errors
    ///
    /// Returns the provider error when deletion fails.
    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), Self::Error>;
}
