//! Radio board support and interrupt routing
//!
//! This module contains:
//! - The register-level board trait the device brings the radio up with
//! - An SX127x implementation over embedded-hal SPI and GPIO
//! - The DIO interrupt dispatcher

/// DIO interrupt routing
pub mod irq;

/// SX127x board support
pub mod sx127x;

/// Radio board trait and constants
pub mod traits;

pub use irq::{Edges, GpioIrq, IrqError, RadioIrqDispatcher};
pub use sx127x::{RadioError, Sx127xBoard};
pub use traits::{DioIrqHandler, RadioBoard, REG_VERSION, SX127X_VERSION};
