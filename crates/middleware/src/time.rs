use std::fmt;
use std::time::Duration;

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// A point in time as whole seconds plus a nanosecond remainder.
///
/// Both API generations carry their own native timestamp type; each backend
/// converts to and from this pair so application code only ever sees one
/// representation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    sec: u32,
    nsec: u32,
}

impl Time {
    /// Creates a time from seconds and nanoseconds.
    ///
    /// Nanoseconds of a second or more carry into the seconds field, which
    /// saturates at `u32::MAX`.
    #[must_use]
    pub const fn new(seconds: u32, nanoseconds: u32) -> Self {
        Self {
            sec: seconds.saturating_add(nanoseconds / NANOS_PER_SEC),
            nsec: nanoseconds % NANOS_PER_SEC,
        }
    }

    /// Creates a time from a signed nanosecond count.
    ///
    /// Negative counts clamp to zero; counts past the representable range
    /// saturate the seconds field.
    #[must_use]
    pub fn from_nanos(nanos: i64) -> Self {
        if nanos <= 0 {
            return Self::default();
        }
        let nanos = nanos.unsigned_abs();
        let sec = u32::try_from(nanos / u64::from(NANOS_PER_SEC)).unwrap_or(u32::MAX);
        #[allow(clippy::cast_possible_truncation)]
        let nsec = (nanos % u64::from(NANOS_PER_SEC)) as u32;
        Self { sec, nsec }
    }

    /// Whole seconds.
    #[must_use]
    pub const fn seconds(&self) -> u32 {
        self.sec
    }

    /// Nanoseconds past the last whole second.
    #[must_use]
    pub const fn nanoseconds(&self) -> u32 {
        self.nsec
    }

    /// Total nanoseconds.
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.sec as u64 * NANOS_PER_SEC as u64 + self.nsec as u64
    }
}

impl From<Duration> for Time {
    fn from(duration: Duration) -> Self {
        let sec = u32::try_from(duration.as_secs()).unwrap_or(u32::MAX);
        Self::new(sec, duration.subsec_nanos())
    }
}

impl From<Time> for Duration {
    fn from(time: Time) -> Self {
        Self::new(u64::from(time.sec), time.nsec)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}
