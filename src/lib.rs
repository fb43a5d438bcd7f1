//! Platform adaptation layer for a LoRaWAN end-device stack
//!
//! This crate sits underneath an external LoRaWAN MAC engine on a small
//! microcontroller (RP2040 + SX1276 being the reference board). It does not
//! implement the MAC itself. It provides the pieces the MAC needs from the
//! platform and the application-facing surface on top of it.
//!
//! # Features
//! - Session context persistence in raw NOR flash (sector cache, erase and
//!   page reprogramming, write-through or deferred flush)
//! - Nestable critical sections and an interrupt-safe pending-work flag
//! - Microsecond RTC with a single-shot alarm
//! - Radio DIO interrupt routing
//! - Non-blocking `process` / bounded `process_with_timeout` event loop
//! - Single-slot uplink and downlink mailboxes
//!
//! # Example
//! ```ignore
//! use pico_lorawan::{
//!     config::OtaaSettings,
//!     device::LoRaWANDevice,
//!     lorawan::Region,
//!     sync::PendingWorkFlag,
//! };
//!
//! static PENDING: PendingWorkFlag = PendingWorkFlag::new();
//!
//! let otaa = OtaaSettings::from_hex(DEV_EUI, APP_EUI, APP_KEY, None)?;
//! let mut device = LoRaWANDevice::new(mac, radio, nvm, platform, &PENDING);
//! device.init_otaa(Region::US915, otaa)?;
//! device.join();
//! while !device.is_joined() {
//!     device.process();
//! }
//! device.send_unconfirmed(b"hello world!", 2)?;
//! ```

#![warn(missing_docs)]
#![no_std]

/// Board level platform services
pub mod board;

/// Device and network configuration
pub mod config;

/// High-level device interface
pub mod device;

/// Contract with the external LoRaWAN MAC engine
pub mod lorawan;

/// Flash backed non-volatile storage
pub mod nvm;

/// Radio board support and interrupt routing
pub mod radio;

/// Event loop and application mailboxes
pub mod session;

/// Critical sections and interrupt shared flags
pub mod sync;

/// Real-time clock and alarm scheduling
pub mod timer;
