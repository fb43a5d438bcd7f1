//! Event loop and application mailboxes
//!
//! This module contains:
//! - The single-slot uplink and downlink mailboxes
//! - The session context the MAC engine reports into
//! - The non-blocking and bounded processing loops

/// Uplink and downlink mailboxes
pub mod buffer;

/// Engine callback handling
pub mod context;

/// Processing loops
pub mod event_loop;

pub use buffer::{SendError, UplinkDownlinkBuffer};
pub use context::{FollowUp, SessionContext};
pub use event_loop::{Outcome, SessionEventLoop, WorkState};
