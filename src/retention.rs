//! Retention window for snapshot pruning.

use std::fmt;

/// Number of days a snapshot is kept before it becomes eligible for deletion.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RetentionDays(u32);

impl RetentionDays {
    /// Retention applied when neither the trigger nor configuration sets one.
    pub const DEFAULT: Self = Self(30);

    /// Wraps a day count.
    #[must_use]
    pub const fn new(days: u32) -> Self {
        Self(days)
    }

    /// Returns the day count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for RetentionDays {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for RetentionDays {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for RetentionDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.0)
    }
}
