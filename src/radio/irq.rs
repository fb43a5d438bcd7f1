//! DIO interrupt routing
//!
//! The SX127x signals TX done / RX done on DIO0 and RX timeout / FHSS change
//! on DIO1. The GPIO controller raises a single interrupt for every pin, so
//! the board's handler forwards `(pin, events)` to [`RadioIrqDispatcher::dispatch`],
//! which runs the radio driver's handler for the matching line.

use core::ops::BitOr;

use super::traits::DioIrqHandler;
use crate::config::board::{Pin, RadioPinConfig};

/// Set of GPIO edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Edges(u8);

impl Edges {
    /// No edge
    pub const NONE: Edges = Edges(0);
    /// Low to high
    pub const RISE: Edges = Edges(1 << 0);
    /// High to low
    pub const FALL: Edges = Edges(1 << 1);

    /// Whether any edge of `other` is in this set
    pub const fn intersects(self, other: Edges) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether every edge of `other` is in this set
    pub const fn contains(self, other: Edges) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit pattern (bit 0 rise, bit 1 fall)
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Edges {
    type Output = Edges;

    fn bitor(self, rhs: Edges) -> Edges {
        Edges(self.0 | rhs.0)
    }
}

/// GPIO interrupt controller
pub trait GpioIrq {
    /// Enable the interrupt of GPIO `pin` on `edges`
    fn enable_irq(&mut self, pin: u8, edges: Edges);
}

/// Interrupt routing error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqError {
    /// Handlers were already registered
    AlreadyInitialised,
}

/// Edges enabled for each line
const LINE_EDGES: [Edges; 2] = [Edges::RISE, Edges(Edges::RISE.0 | Edges::FALL.0)];

/// Routes GPIO interrupts to the radio's DIO handlers
pub struct RadioIrqDispatcher<'a> {
    pins: [Pin; 2],
    handlers: [Option<DioIrqHandler<'a>>; 2],
    initialised: bool,
}

impl<'a> RadioIrqDispatcher<'a> {
    /// Dispatcher for the radio's DIO0 and DIO1 lines
    pub const fn new(dio0: Pin, dio1: Pin) -> Self {
        Self {
            pins: [dio0, dio1],
            handlers: [None, None],
            initialised: false,
        }
    }

    /// Dispatcher for the DIO lines of a radio module's wiring
    pub const fn from_config(config: &RadioPinConfig) -> Self {
        Self::new(config.dio0, config.dio1)
    }

    /// Register the line handlers and enable their interrupts
    ///
    /// DIO0 fires on the rising edge, DIO1 on both edges. Lines that are not
    /// connected are skipped. Handlers can only be registered once.
    pub fn init(
        &mut self,
        handlers: [Option<DioIrqHandler<'a>>; 2],
        gpio: &mut impl GpioIrq,
    ) -> Result<(), IrqError> {
        if self.initialised {
            return Err(IrqError::AlreadyInitialised);
        }
        self.handlers = handlers;
        self.initialised = true;

        for (pin, edges) in self.pins.iter().zip(LINE_EDGES) {
            if let Some(number) = pin.number() {
                gpio.enable_irq(number, edges);
            }
        }
        Ok(())
    }

    /// Whether handlers have been registered
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// GPIO interrupt entry point
    ///
    /// Returns whether a handler ran.
    pub fn dispatch(&self, pin: u8, events: Edges) -> bool {
        let line = self
            .pins
            .iter()
            .position(|p| p.number() == Some(pin));

        let Some(line) = line else {
            return false;
        };
        if !events.intersects(LINE_EDGES[line]) {
            return false;
        }
        match self.handlers[line] {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}
