use embedded_hal::{
    blocking::{
        delay::DelayMs,
        spi::{Transfer, Write},
    },
    digital::v2::OutputPin,
};

use crate::radio::traits::RadioBoard;

// SPI address byte: bit 7 selects write access
const SPI_WRITE: u8 = 0x80;
const SPI_ADDR_MASK: u8 = 0x7F;

const REG_FIFO: u8 = 0x00;

// Reset pulse timing in milliseconds
const RESET_PULSE_MS: u8 = 1;
const RESET_STARTUP_MS: u8 = 6;

/// Possible errors in radio board operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// SPI transfer error
    Spi,
    /// GPIO error
    Gpio,
}

/// SX127x module wired over SPI
///
/// `NSS` is driven by hand around each access; the SPI peripheral must run
/// in mode 0 at up to 10 MHz.
pub struct Sx127xBoard<SPI, NSS, RESET, DELAY>
where
    SPI: Transfer<u8> + Write<u8>,
    NSS: OutputPin,
    RESET: OutputPin,
    DELAY: DelayMs<u8>,
{
    spi: SPI,
    nss: NSS,
    reset: RESET,
    delay: DELAY,
}

impl<SPI, NSS, RESET, DELAY> Sx127xBoard<SPI, NSS, RESET, DELAY>
where
    SPI: Transfer<u8> + Write<u8>,
    NSS: OutputPin,
    RESET: OutputPin,
    DELAY: DelayMs<u8>,
{
    /// Create the board; no bus traffic happens until `io_init`
    pub fn new(spi: SPI, nss: NSS, reset: RESET, delay: DELAY) -> Self {
        Self {
            spi,
            nss,
            reset,
            delay,
        }
    }

    /// Give back the bus, pins and delay
    pub fn release(self) -> (SPI, NSS, RESET, DELAY) {
        (self.spi, self.nss, self.reset, self.delay)
    }

    /// Burst read starting at `addr`
    pub fn read_buffer(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), RadioError> {
        self.select()?;
        let result = self.transfer_from(addr & SPI_ADDR_MASK, buffer);
        self.deselect()?;
        result
    }

    /// Burst write starting at `addr`
    pub fn write_buffer(&mut self, addr: u8, buffer: &[u8]) -> Result<(), RadioError> {
        self.select()?;
        let result = self.write_to(addr | SPI_WRITE, buffer);
        self.deselect()?;
        result
    }

    /// Read from the packet FIFO
    pub fn read_fifo(&mut self, buffer: &mut [u8]) -> Result<(), RadioError> {
        self.read_buffer(REG_FIFO, buffer)
    }

    /// Write into the packet FIFO
    pub fn write_fifo(&mut self, buffer: &[u8]) -> Result<(), RadioError> {
        self.write_buffer(REG_FIFO, buffer)
    }

    fn transfer_from(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), RadioError> {
        self.spi.write(&[addr]).map_err(|_| RadioError::Spi)?;
        self.spi.transfer(buffer).map_err(|_| RadioError::Spi)?;
        Ok(())
    }

    fn write_to(&mut self, addr: u8, buffer: &[u8]) -> Result<(), RadioError> {
        self.spi.write(&[addr]).map_err(|_| RadioError::Spi)?;
        self.spi.write(buffer).map_err(|_| RadioError::Spi)
    }

    fn select(&mut self) -> Result<(), RadioError> {
        self.nss.set_low().map_err(|_| RadioError::Gpio)
    }

    fn deselect(&mut self) -> Result<(), RadioError> {
        self.nss.set_high().map_err(|_| RadioError::Gpio)
    }
}

impl<SPI, NSS, RESET, DELAY> RadioBoard for Sx127xBoard<SPI, NSS, RESET, DELAY>
where
    SPI: Transfer<u8> + Write<u8>,
    NSS: OutputPin,
    RESET: OutputPin,
    DELAY: DelayMs<u8>,
{
    type Error = RadioError;

    fn io_init(&mut self) -> Result<(), Self::Error> {
        self.deselect()?;
        self.reset.set_high().map_err(|_| RadioError::Gpio)
    }

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.reset.set_low().map_err(|_| RadioError::Gpio)?;
        self.delay.delay_ms(RESET_PULSE_MS);
        self.reset.set_high().map_err(|_| RadioError::Gpio)?;
        self.delay.delay_ms(RESET_STARTUP_MS);
        Ok(())
    }

    fn read_register(&mut self, addr: u8) -> Result<u8, Self::Error> {
        let mut value = [0u8];
        self.read_buffer(addr, &mut value)?;
        Ok(value[0])
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Self::Error> {
        self.write_buffer(addr, &[value])
    }
}
