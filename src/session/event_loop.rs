use core::time::Duration;

use super::context::SessionContext;
use crate::board::Platform;
use crate::lorawan::mac::MacEngine;
use crate::nvm::NvmStorage;
use crate::sync::PendingWorkFlag;

/// Result of one processing pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WorkState {
    /// The engine asked for another pass; do not sleep
    Pending,
    /// Nothing to do until the next interrupt
    Idle,
}

impl WorkState {
    /// Whether the processor may wait for an event
    pub fn is_sleep_allowed(&self) -> bool {
        matches!(self, WorkState::Idle)
    }
}

/// Why a bounded processing run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// A downlink arrived or the join status changed
    Event,
    /// The deadline passed first
    TimedOut,
}

impl Outcome {
    /// Numeric result: 0 for an event, 1 for a timeout
    pub fn code(&self) -> i32 {
        match self {
            Outcome::Event => 0,
            Outcome::TimedOut => 1,
        }
    }
}

/// Drives the MAC engine from the main loop
pub struct SessionEventLoop<'a> {
    pending: &'a PendingWorkFlag,
}

impl<'a> SessionEventLoop<'a> {
    /// Loop fed by `pending`, the flag the engine notifies
    pub fn new(pending: &'a PendingWorkFlag) -> Self {
        Self { pending }
    }

    /// Flag consumed by this loop
    pub fn pending(&self) -> &'a PendingWorkFlag {
        self.pending
    }

    /// Run one engine iteration and report whether more work is pending
    ///
    /// Requests queued by the engine callbacks are issued right after the
    /// iteration. The pending flag is read and cleared atomically, so a
    /// notification raised during the iteration is reported here and one
    /// raised afterwards is kept for the next call.
    pub fn process<M, S>(&self, mac: &mut M, session: &mut SessionContext<S>) -> WorkState
    where
        M: MacEngine,
        S: NvmStorage,
    {
        mac.process(session);
        session.apply_follow_ups(mac);

        if self.pending.take() {
            WorkState::Pending
        } else {
            WorkState::Idle
        }
    }

    /// Process until a downlink arrives, the join status flips, or `timeout`
    /// elapses
    ///
    /// At least one iteration always runs. Between iterations the platform
    /// waits for the next hardware event, but never past the deadline.
    pub fn process_with_timeout<M, S, P>(
        &self,
        mac: &mut M,
        session: &mut SessionContext<S>,
        platform: &mut P,
        timeout: Duration,
    ) -> Outcome
    where
        M: MacEngine,
        S: NvmStorage,
        P: Platform,
    {
        let deadline = platform.now() + timeout;
        let joined = mac.is_joined();

        loop {
            let state = self.process(mac, session);

            if session.buffers().has_downlink() || mac.is_joined() != joined {
                return Outcome::Event;
            }

            let timed_out = match state {
                WorkState::Pending => platform.now() >= deadline,
                WorkState::Idle => platform.wait_for_event_until(deadline),
            };
            if timed_out {
                return Outcome::TimedOut;
            }
        }
    }
}
