//! Board level platform services

use crate::timer::{Clock, Instant};

/// Services the board provides to the event loop and the device
pub trait Platform: Clock {
    /// Block until the next hardware event or until `deadline`
    ///
    /// Returns `true` once `deadline` has been reached. Spurious early
    /// wake-ups are allowed; waking after the deadline is not.
    fn wait_for_event_until(&mut self, deadline: Instant) -> bool;

    /// 64-bit unique board identifier (flash unique id on the Pico)
    fn unique_id(&self) -> [u8; 8];

    /// Seed for the MAC engine's pseudo-random numbers
    fn random_seed(&self) -> u32 {
        let id = self.unique_id();
        u32::from_le_bytes([id[0], id[1], id[2], id[3]])
    }
}
