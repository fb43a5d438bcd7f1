//! Radio pin assignments

/// GPIO number, or [`Pin::NC`] when the signal is not wired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin(u8);

impl Pin {
    /// Not connected
    pub const NC: Pin = Pin(u8::MAX);

    /// Wired to GPIO `number`
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    /// GPIO number, `None` when not connected
    pub fn number(&self) -> Option<u8> {
        if *self == Self::NC {
            None
        } else {
            Some(self.0)
        }
    }

    /// Whether the signal is wired
    pub fn is_connected(&self) -> bool {
        *self != Self::NC
    }
}

/// SPI controller instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiInstance {
    /// First SPI controller
    Spi0,
    /// Second SPI controller
    Spi1,
}

/// SPI wiring of the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiPins {
    /// Controller driving the radio
    pub inst: SpiInstance,
    /// Controller out, radio in
    pub mosi: Pin,
    /// Controller in, radio out
    pub miso: Pin,
    /// Clock
    pub sck: Pin,
    /// Chip select
    pub nss: Pin,
}

/// Pin configuration of an SX127x radio module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioPinConfig {
    /// SPI wiring
    pub spi: SpiPins,
    /// Reset line
    pub reset: Pin,
    /// DIO0 ("IRQ") line
    pub dio0: Pin,
    /// DIO1 line
    pub dio1: Pin,
}

impl Default for RadioPinConfig {
    /// Wiring of the Pico + SX1276 reference board
    fn default() -> Self {
        Self {
            spi: SpiPins {
                inst: SpiInstance::Spi0,
                mosi: Pin::new(19),
                miso: Pin::new(16),
                sck: Pin::new(18),
                nss: Pin::new(8),
            },
            reset: Pin::new(9),
            dio0: Pin::new(7),
            dio1: Pin::new(10),
        }
    }
}
