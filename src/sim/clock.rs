use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// Wall-clock source for timestamps and elapsed-time integration.
pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same instant, so a test can keep one handle and give
/// another to the simulation.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use meter_light_sim::sim::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::at_millis(0);
/// let handle = clock.clone();
/// handle.advance(Duration::hours(1));
/// assert_eq!(clock.now().timestamp(), 3600);
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    /// Creates a clock frozen at the given unix time in milliseconds.
    pub fn at_millis(millis: i64) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(millis)),
        }
    }

    /// Moves the shared instant forward (or backward for negative spans).
    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}
