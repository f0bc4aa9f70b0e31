//! Clock abstraction producing UTC instants.
//!
//! All date arithmetic is done on `DateTime<Utc>` so results do not depend on
//! the host's local timezone. [`FixedClock`] pins "now" for deterministic
//! tests.

use chrono::{DateTime, Utc};

use crate::retention::RetentionDays;

/// `strftime` pattern used for snapshot name timestamps (`YYYYMMDDHHMMSS`).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Source of the current instant.
pub trait Clock {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Returns `true` when the whole number of days between now and `instant`
    /// strictly exceeds `days`.
    ///
    /// The day count truncates toward zero, so an instant 47 hours ago is one
    /// day old. Instants in the future are never older than any window.
    fn older_than(&self, instant: DateTime<Utc>, days: RetentionDays) -> bool {
        self.now().signed_duration_since(instant).num_days() > i64::from(days.get())
    }

    /// Formats the current instant with [`TIMESTAMP_FORMAT`].
    fn timestamp(&self) -> String {
        self.now().format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Wall clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that always reports the same instant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    /// Pins the clock at `instant`.
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
