//! Real-time clock and alarm scheduling
//!
//! This module contains:
//! - A microsecond timestamp type
//! - The clock abstraction used by the event loop
//! - The RTC alarm scheduler backing the MAC engine's timers

/// RTC and single-shot alarm scheduler
pub mod rtc;

pub use rtc::{AlarmError, AlarmId, AlarmTimer, RtcAlarmScheduler};

use core::ops::Add;
use core::time::Duration;

/// Monotonic timestamp in microseconds since an arbitrary epoch (usually boot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(u64);

impl Instant {
    /// Timestamp at the epoch
    pub const ZERO: Instant = Instant(0);

    /// Create a timestamp from microseconds since the epoch
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Microseconds since the epoch
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Milliseconds since the epoch
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000
    }

    /// Time elapsed from `earlier` to `self`, or `None` if `earlier` is later
    pub fn checked_duration_since(&self, earlier: Instant) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration::from_micros)
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later
    pub fn saturating_duration_since(&self, earlier: Instant) -> Duration {
        self.checked_duration_since(earlier).unwrap_or(Duration::ZERO)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Instant(self.0.saturating_add(micros))
    }
}

/// Source of the current time
pub trait Clock {
    /// Current timestamp
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
