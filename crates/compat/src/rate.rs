use std::thread;
use std::time::{Duration, Instant};

use tracing::{trace, warn};

/// Paces a loop at a fixed frequency.
///
/// [`Rate::sleep`] waits out whatever is left of the current cycle, so the
/// time the loop body took counts against the period:
///
/// ```no_run
/// use compat::{Node, Rate};
///
/// let node = Node::init(std::env::args(), "ticker").unwrap();
/// let mut rate = Rate::new(10.0);
/// while node.ok() {
///     node.spin_once();
///     rate.sleep();
/// }
/// ```
///
/// A cycle that overran by a whole period or more restarts the schedule
/// from now instead of trying to catch up.
#[derive(Clone, Debug)]
pub struct Rate {
    period: Duration,
    cycle_start: Instant,
    last_cycle: Duration,
}

impl Rate {
    /// A rate of `frequency` cycles per second.
    ///
    /// A frequency that is not positive gives a zero period; `sleep` then
    /// never waits.
    #[must_use]
    pub fn new(frequency: f64) -> Self {
        let period = Duration::try_from_secs_f64(frequency.recip()).unwrap_or_else(|_| {
            warn!(frequency, "invalid rate frequency, loop will not be paced");
            Duration::ZERO
        });
        Self::from_period(period)
    }

    /// A rate with the given cycle length. The first cycle starts now.
    #[must_use]
    pub fn from_period(period: Duration) -> Self {
        Self {
            period,
            cycle_start: Instant::now(),
            last_cycle: Duration::ZERO,
        }
    }

    /// Sleeps until the end of the current cycle and starts the next one.
    ///
    /// Returns `false` without sleeping if the cycle already overran.
    pub fn sleep(&mut self) -> bool {
        let now = Instant::now();
        let cycle_end = self.cycle_start + self.period;
        self.last_cycle = now.saturating_duration_since(self.cycle_start);

        if now < cycle_end {
            thread::sleep(cycle_end - now);
            self.cycle_start = cycle_end;
            return true;
        }

        if now >= cycle_end + self.period {
            self.cycle_start = now;
        } else {
            self.cycle_start = cycle_end;
        }
        trace!(period = ?self.period, cycle = ?self.last_cycle, "rate missed its cycle");
        false
    }

    /// Starts a fresh cycle now.
    pub fn reset(&mut self) {
        self.cycle_start = Instant::now();
    }

    /// The configured cycle length.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// How long the last completed cycle took before `sleep` was called.
    #[must_use]
    pub const fn cycle_time(&self) -> Duration {
        self.last_cycle
    }
}
