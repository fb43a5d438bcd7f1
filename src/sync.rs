//! Critical sections and interrupt shared flags
//!
//! The main loop and interrupt handlers share a few words of state. Every
//! main-loop access that could race with an interrupt goes through a
//! [`CriticalSectionGuard`].

use core::cell::Cell;
use core::marker::PhantomData;

use critical_section::{CriticalSection, Mutex, RestoreState};

/// Scoped interrupt disable
///
/// Entering captures the previous interrupt state as an opaque token and
/// leaving restores exactly that state, so guards nest: an inner guard never
/// re-enables interrupts that an outer guard disabled. Guards must be released
/// in reverse order of acquisition.
pub struct CriticalSectionGuard {
    restore: RestoreState,
    // Must be released on the acquiring context.
    _not_send: PhantomData<*mut ()>,
}

impl CriticalSectionGuard {
    /// Disable interrupts and remember the previous state
    pub fn enter() -> Self {
        // SAFETY: the matching release happens in `Drop`, and the guard is
        // neither `Send` nor `Copy`, so it is released exactly once on the
        // context that acquired it.
        let restore = unsafe { critical_section::acquire() };
        Self {
            restore,
            _not_send: PhantomData,
        }
    }

    /// Leave the critical section, restoring the state captured by `enter`
    pub fn exit(self) {
        drop(self);
    }

    /// Token proving interrupts are disabled, for `critical_section::Mutex`
    pub fn token(&self) -> CriticalSection<'_> {
        // SAFETY: the guard holds the critical section for at least as long as
        // the returned token borrows it.
        unsafe { CriticalSection::new() }
    }
}

impl Drop for CriticalSectionGuard {
    fn drop(&mut self) {
        // SAFETY: `restore` came from the `acquire` in `enter`.
        unsafe { critical_section::release(self.restore) }
    }
}

/// "More MAC work pending" flag
///
/// Set from interrupt context whenever the MAC engine wants another
/// processing pass, and cleared only by the event loop after it has observed
/// the flag set. Read-and-clear happens under a critical section so a
/// notification arriving in between can never be lost.
pub struct PendingWorkFlag {
    pending: Mutex<Cell<bool>>,
}

impl PendingWorkFlag {
    /// Create a cleared flag
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(false)),
        }
    }

    /// Signal that the MAC engine needs another pass
    ///
    /// Safe to call from interrupt context.
    pub fn notify(&self) {
        let guard = CriticalSectionGuard::enter();
        self.pending.borrow(guard.token()).set(true);
    }

    /// Read and clear the flag atomically
    ///
    /// Returns `true` if work was signalled since the last call.
    pub fn take(&self) -> bool {
        let guard = CriticalSectionGuard::enter();
        self.pending.borrow(guard.token()).replace(false)
    }

    /// Peek at the flag without clearing it
    pub fn is_set(&self) -> bool {
        let guard = CriticalSectionGuard::enter();
        self.pending.borrow(guard.token()).get()
    }
}

impl Default for PendingWorkFlag {
    fn default() -> Self {
        Self::new()
    }
}
