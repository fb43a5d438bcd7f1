/// Register of the chip silicon revision
pub const REG_VERSION: u8 = 0x42;

/// Silicon revision reported by an SX1276/77/78/79
pub const SX127X_VERSION: u8 = 0x12;

/// Handler for a radio DIO line, run in interrupt context
pub type DioIrqHandler<'a> = &'a (dyn Fn() + Sync);

/// Low-level access to the radio transceiver
///
/// The MAC engine's radio driver owns modulation and packet handling; this
/// trait only covers what the platform layer needs to bring the chip up and
/// to hand register access over to that driver.
pub trait RadioBoard {
    /// Error type for bus and pin operations
    type Error;

    /// Configure the SPI bus, chip select and reset line
    fn io_init(&mut self) -> Result<(), Self::Error>;

    /// Pulse the reset line and wait for the chip to start
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// Read a single register
    fn read_register(&mut self, addr: u8) -> Result<u8, Self::Error>;

    /// Write a single register
    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Self::Error>;

    /// Silicon revision of the attached chip
    fn version(&mut self) -> Result<u8, Self::Error> {
        self.read_register(REG_VERSION)
    }
}
