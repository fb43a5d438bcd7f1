//! Contract with the external LoRaWAN MAC engine
//!
//! The MAC state machine (join procedure, ADR, frame crypto, retransmission)
//! lives outside this crate. This module contains the narrow interface it is
//! driven through:
//! - The engine trait and its init parameters
//! - The callback trait the engine reports events through
//! - Region identifiers

/// Engine callbacks and event parameters
pub mod handler;

/// Engine trait, parameters and status codes
pub mod mac;

/// Region identifiers
pub mod region;

pub use handler::{CommissioningParams, MacHandler};
pub use mac::{MacEngine, MacParams, MacStatus, MsgType};
pub use region::Region;
