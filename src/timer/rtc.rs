//! RTC and single-shot alarm scheduler
//!
//! The MAC engine keeps its own list of software timers and only ever needs
//! one hardware alarm: the earliest of its timers. This scheduler owns that
//! alarm. Every method takes `&self` so the scheduler can be shared between
//! the main loop and the alarm interrupt; internal state is only touched
//! inside a critical section.

use core::cell::{Cell, RefCell};
use core::time::Duration;

use critical_section::Mutex;

use super::{Clock, Instant};
use crate::sync::CriticalSectionGuard;

/// Hardware alarm handle returned by the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmId(pub u32);

/// Alarm scheduling error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmError {
    /// The hardware alarm pool has no free slot
    PoolExhausted,
}

/// Microsecond timer with an alarm pool
///
/// When an alarm added with [`AlarmTimer::add_alarm_at`] expires, the
/// platform's interrupt handler must call [`RtcAlarmScheduler::on_alarm`]
/// with the id it returned. Alarms whose time has already passed fire as soon
/// as possible, but never from inside `add_alarm_at` itself.
pub trait AlarmTimer {
    /// Shortest delay the hardware can reliably schedule, in microseconds
    const MIN_TIMEOUT_US: u32 = 1;

    /// Microseconds since boot
    fn now_us(&self) -> u64;

    /// Schedule an alarm at an absolute time
    fn add_alarm_at(&mut self, at_us: u64) -> Option<AlarmId>;

    /// Cancel a scheduled alarm; unknown or expired ids are ignored
    fn cancel_alarm(&mut self, id: AlarmId);
}

/// RTC backed by an [`AlarmTimer`], driving a single fixed timer hook
pub struct RtcAlarmScheduler<T, H> {
    timer: Mutex<RefCell<T>>,
    context: Mutex<Cell<Instant>>,
    armed: Mutex<Cell<Option<AlarmId>>>,
    hook: H,
}

impl<T: AlarmTimer, H: Fn()> RtcAlarmScheduler<T, H> {
    /// Create the scheduler and take the initial timer context
    ///
    /// `hook` is the MAC engine's timer tick handler. It runs in interrupt
    /// context each time the armed alarm expires.
    pub fn new(timer: T, hook: H) -> Self {
        let context = Instant::from_micros(timer.now_us());
        Self {
            timer: Mutex::new(RefCell::new(timer)),
            context: Mutex::new(Cell::new(context)),
            armed: Mutex::new(Cell::new(None)),
            hook,
        }
    }

    /// Current timestamp
    pub fn now(&self) -> Instant {
        let guard = CriticalSectionGuard::enter();
        let now = self.timer.borrow(guard.token()).borrow().now_us();
        Instant::from_micros(now)
    }

    /// Reset the reference point for relative queries and return it
    pub fn set_timer_context(&self) -> Instant {
        let now = self.now();
        let guard = CriticalSectionGuard::enter();
        self.context.borrow(guard.token()).set(now);
        now
    }

    /// Reference point stored by the last [`set_timer_context`](Self::set_timer_context)
    pub fn timer_context(&self) -> Instant {
        let guard = CriticalSectionGuard::enter();
        self.context.borrow(guard.token()).get()
    }

    /// Time elapsed since the stored timer context
    pub fn elapsed(&self) -> Duration {
        self.elapsed_since(self.timer_context())
    }

    /// Time elapsed since `context`
    pub fn elapsed_since(&self, context: Instant) -> Duration {
        self.now().saturating_duration_since(context)
    }

    /// Smallest delay worth arming; never zero
    pub fn minimum_timeout(&self) -> Duration {
        Duration::from_micros(u64::from(T::MIN_TIMEOUT_US.max(1)))
    }

    /// Arm the alarm `delay` after the timer context
    ///
    /// Any previously armed alarm is cancelled first, so at most one alarm is
    /// ever outstanding.
    pub fn arm_alarm(&self, delay: Duration) -> Result<(), AlarmError> {
        let guard = CriticalSectionGuard::enter();
        let cs = guard.token();
        let mut timer = self.timer.borrow(cs).borrow_mut();
        let armed = self.armed.borrow(cs);

        if let Some(previous) = armed.take() {
            timer.cancel_alarm(previous);
        }

        let at = self.context.borrow(cs).get() + delay;
        let id = timer
            .add_alarm_at(at.as_micros())
            .ok_or(AlarmError::PoolExhausted)?;
        armed.set(Some(id));
        Ok(())
    }

    /// Cancel the armed alarm, if any
    pub fn cancel_alarm(&self) {
        let guard = CriticalSectionGuard::enter();
        let cs = guard.token();
        if let Some(id) = self.armed.borrow(cs).take() {
            self.timer.borrow(cs).borrow_mut().cancel_alarm(id);
        }
    }

    /// Whether an alarm is currently outstanding
    pub fn is_armed(&self) -> bool {
        let guard = CriticalSectionGuard::enter();
        self.armed.borrow(guard.token()).get().is_some()
    }

    /// Alarm interrupt entry point
    ///
    /// Runs the timer hook if `id` is the currently armed alarm. Expiries of
    /// alarms that were cancelled or replaced in the meantime are dropped.
    /// Returns whether the hook ran.
    pub fn on_alarm(&self, id: AlarmId) -> bool {
        let current = {
            let guard = CriticalSectionGuard::enter();
            let armed = self.armed.borrow(guard.token());
            if armed.get() == Some(id) {
                armed.set(None);
                true
            } else {
                false
            }
        };

        if current {
            (self.hook)();
        }
        current
    }

    /// Wall time since boot as (seconds, milliseconds)
    pub fn calendar_time(&self) -> (u32, u16) {
        let millis = self.now().as_millis();
        ((millis / 1_000) as u32, (millis % 1_000) as u16)
    }

    /// Read the backup registers; this platform has none
    pub fn backup_read(&self) -> (u32, u32) {
        (0, 0)
    }

    /// Write the backup registers; this platform has none
    pub fn backup_write(&self, _data0: u32, _data1: u32) {}

    /// Convert milliseconds to timer ticks (microseconds)
    pub const fn ms_to_ticks(ms: u32) -> u32 {
        ms.saturating_mul(1_000)
    }

    /// Convert timer ticks (microseconds) to milliseconds
    pub const fn ticks_to_ms(ticks: u32) -> u32 {
        ticks / 1_000
    }
}

impl<T: AlarmTimer, H: Fn()> Clock for RtcAlarmScheduler<T, H> {
    fn now(&self) -> Instant {
        RtcAlarmScheduler::now(self)
    }
}
