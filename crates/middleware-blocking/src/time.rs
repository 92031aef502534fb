use compat_middleware::Time;

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock stamp in the shape the synchronous API generation uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct WallStamp {
    /// Seconds since the Unix epoch.
    pub sec: u32,
    /// Nanoseconds past `sec`.
    pub nsec: u32,
}

impl WallStamp {
    /// Reads the system clock.
    ///
    /// A clock set before the epoch reads as zero.
    #[must_use]
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| Time::from(elapsed).into())
            .unwrap_or_default()
    }
}

impl From<Time> for WallStamp {
    fn from(time: Time) -> Self {
        Self {
            sec: time.seconds(),
            nsec: time.nanoseconds(),
        }
    }
}

impl From<WallStamp> for Time {
    fn from(stamp: WallStamp) -> Self {
        Self::new(stamp.sec, stamp.nsec)
    }
}
