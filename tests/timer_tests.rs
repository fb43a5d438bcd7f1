use core::cell::Cell;
use core::time::Duration;

use pico_lorawan::timer::{AlarmError, AlarmId, Clock, Instant, RtcAlarmScheduler};

mod mock;
use mock::{MockAlarmTimer, SimClock};

type Scheduler<'h> = RtcAlarmScheduler<MockAlarmTimer, &'h dyn Fn()>;

#[test]
fn test_instant_arithmetic() {
    let t = Instant::from_micros(1_500);
    assert_eq!(t.as_millis(), 1);
    assert_eq!(t + Duration::from_millis(2), Instant::from_micros(3_500));
    assert_eq!(
        Instant::from_micros(u64::MAX) + Duration::from_secs(1),
        Instant::from_micros(u64::MAX)
    );
    assert_eq!(t.checked_duration_since(Instant::from_micros(2_000)), None);
    assert_eq!(
        t.saturating_duration_since(Instant::ZERO),
        Duration::from_micros(1_500)
    );
}

#[test]
fn test_timer_context_and_elapsed() {
    let clock = SimClock::new();
    clock.set_us(1_000);
    let (timer, _log) = MockAlarmTimer::new(clock.clone());
    let hook = || {};
    let rtc: Scheduler = RtcAlarmScheduler::new(timer, &hook);

    assert_eq!(rtc.timer_context(), Instant::from_micros(1_000));
    clock.advance_us(2_500);
    assert_eq!(rtc.elapsed(), Duration::from_micros(2_500));

    let context = rtc.set_timer_context();
    assert_eq!(context, Instant::from_micros(3_500));
    assert_eq!(rtc.elapsed(), Duration::ZERO);
    assert_eq!(rtc.now(), Clock::now(&rtc));
}

#[test]
fn test_alarm_armed_relative_to_context() {
    let clock = SimClock::new();
    let (timer, log) = MockAlarmTimer::new(clock.clone());
    let hook = || {};
    let rtc: Scheduler = RtcAlarmScheduler::new(timer, &hook);

    clock.set_us(10_000);
    rtc.set_timer_context();
    clock.set_us(12_000);
    rtc.arm_alarm(Duration::from_millis(5)).unwrap();

    assert!(rtc.is_armed());
    assert_eq!(log.borrow().active, vec![(AlarmId(1), 15_000)]);
}

#[test]
fn test_rearm_cancels_previous_alarm() {
    let clock = SimClock::new();
    let (timer, log) = MockAlarmTimer::new(clock);
    let hook = || {};
    let rtc: Scheduler = RtcAlarmScheduler::new(timer, &hook);

    rtc.arm_alarm(Duration::from_millis(10)).unwrap();
    rtc.arm_alarm(Duration::from_millis(20)).unwrap();

    let log = log.borrow();
    assert_eq!(log.cancelled, vec![AlarmId(1)]);
    assert_eq!(log.active, vec![(AlarmId(2), 20_000)]);
}

#[test]
fn test_on_alarm_runs_hook_once() {
    let fired = Cell::new(0);
    let hook = || fired.set(fired.get() + 1);
    let (timer, _log) = MockAlarmTimer::new(SimClock::new());
    let rtc: Scheduler = RtcAlarmScheduler::new(timer, &hook);

    rtc.arm_alarm(Duration::from_millis(1)).unwrap();
    assert!(rtc.on_alarm(AlarmId(1)));
    assert!(!rtc.is_armed());
    // A repeated expiry of the same alarm is dropped
    assert!(!rtc.on_alarm(AlarmId(1)));
    assert_eq!(fired.get(), 1);
}

#[test]
fn test_stale_alarm_ignored() {
    let fired = Cell::new(0);
    let hook = || fired.set(fired.get() + 1);
    let (timer, _log) = MockAlarmTimer::new(SimClock::new());
    let rtc: Scheduler = RtcAlarmScheduler::new(timer, &hook);

    rtc.arm_alarm(Duration::from_millis(1)).unwrap();
    rtc.arm_alarm(Duration::from_millis(2)).unwrap();
    assert!(!rtc.on_alarm(AlarmId(1)));
    assert_eq!(fired.get(), 0);

    rtc.cancel_alarm();
    assert!(!rtc.on_alarm(AlarmId(2)));
    assert_eq!(fired.get(), 0);
}

#[test]
fn test_pool_exhausted() {
    let (timer, log) = MockAlarmTimer::new(SimClock::new());
    let hook = || {};
    let rtc: Scheduler = RtcAlarmScheduler::new(timer, &hook);

    log.borrow_mut().exhausted = true;
    assert_eq!(
        rtc.arm_alarm(Duration::from_millis(1)),
        Err(AlarmError::PoolExhausted)
    );
    assert!(!rtc.is_armed());
}

#[test]
fn test_minimum_timeout_and_conversions() {
    let (timer, _log) = MockAlarmTimer::new(SimClock::new());
    let hook = || {};
    let rtc: Scheduler = RtcAlarmScheduler::new(timer, &hook);

    assert!(rtc.minimum_timeout() > Duration::ZERO);
    assert_eq!(Scheduler::ms_to_ticks(20), 20_000);
    assert_eq!(Scheduler::ticks_to_ms(20_999), 20);
    assert_eq!(Scheduler::ms_to_ticks(u32::MAX), u32::MAX);
}

#[test]
fn test_calendar_time_and_backup() {
    let clock = SimClock::new();
    clock.set_us(3_456_789);
    let (timer, _log) = MockAlarmTimer::new(clock);
    let hook = || {};
    let rtc: Scheduler = RtcAlarmScheduler::new(timer, &hook);

    assert_eq!(rtc.calendar_time(), (3, 456));
    rtc.backup_write(1, 2);
    assert_eq!(rtc.backup_read(), (0, 0));
}
