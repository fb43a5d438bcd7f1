//! Device and network configuration
//!
//! This module contains types and functions for configuring the device:
//! - Activation settings (OTAA / ABP) decoded from hexadecimal text
//! - Radio pin assignments
//! - Hexadecimal credential codec

/// Radio pin assignments
pub mod board;

/// Activation settings and device class
pub mod device;

/// Hexadecimal credential codec
pub mod hex;

pub use device::{AbpSettings, ActivationSettings, OtaaSettings};
