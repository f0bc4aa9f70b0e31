//! Tag lookup helpers for tagged cloud resources.
//!
//! Tags are ordered `{Key, Value}` pairs. Keys are not guaranteed to be
//! unique, so lookups always take the first match.

use serde::{Deserialize, Serialize};

/// Tag key marking a volume for inclusion in snapshot runs.
pub const BACKUP_TAG: &str = "Backup";

/// Tag key carrying a human-readable resource name.
pub const NAME_TAG: &str = "Name";

/// The only tag value treated as true by [`has_true_tag`].
pub const TRUE_VALUE: &str = "true";

/// A single key/value tag as reported by the EC2 API.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl Tag {
    /// Creates a tag from any string-like key and value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Resources that may carry a tag sequence.
pub trait Tagged {
    /// Returns the resource's tags, or `None` when the provider omitted them.
    fn tags(&self) -> Option<&[Tag]>;
}

/// Returns the value of the first tag whose key equals `key`.
///
/// Missing tag sequences are treated as empty and yield `""`.
#[must_use]
pub fn tag_value<'a>(key: &str, tags: Option<&'a [Tag]>) -> &'a str {
    tags.unwrap_or_default()
        .iter()
        .find(|tag| tag.key == key)
        .map_or("", |tag| tag.value.as_str())
}

/// Returns `true` when `resource` has a tag `key` whose value is exactly
/// `"true"`.
#[must_use]
pub fn has_true_tag(key: &str, resource: &impl Tagged) -> bool {
    resource
        .tags()
        .unwrap_or_default()
        .iter()
        .any(|tag| tag.key == key && tag.value == TRUE_VALUE)
}
