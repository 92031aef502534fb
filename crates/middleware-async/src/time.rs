use compat_middleware::Time;

use std::time::{SystemTime, UNIX_EPOCH};

/// Clock stamp in the shape the asynchronous API generation uses: a single
/// signed nanosecond count since the epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockStamp {
    nanos: i64,
}

impl ClockStamp {
    /// Creates a stamp from nanoseconds since the epoch.
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self { nanos }
    }

    /// Nanoseconds since the epoch.
    #[must_use]
    pub const fn nanoseconds(&self) -> i64 {
        self.nanos
    }

    /// Reads the system clock.
    #[must_use]
    pub fn now() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX))
            .unwrap_or_default();
        Self { nanos }
    }
}

impl From<Time> for ClockStamp {
    fn from(time: Time) -> Self {
        Self {
            nanos: i64::try_from(time.as_nanos()).unwrap_or(i64::MAX),
        }
    }
}

impl From<ClockStamp> for Time {
    fn from(stamp: ClockStamp) -> Self {
        Self::from_nanos(stamp.nanos)
    }
}
