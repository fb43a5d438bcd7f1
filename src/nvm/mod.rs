//! Flash backed non-volatile storage
//!
//! The MAC engine expects byte-addressable storage for its session context.
//! NOR flash only erases whole sectors and programs whole pages, so
//! [`FlashNvmStore`] bridges the two with a one-sector shadow buffer.

/// Sector-cached NOR flash store
pub mod store;

pub use store::FlashNvmStore;

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};

use embedded_storage::nor_flash::{NorFlashError, NorFlashErrorKind};

/// Smallest programmable unit of the reference flash
pub const FLASH_PAGE_SIZE: u32 = 256;
/// Smallest erasable unit of the reference flash
pub const FLASH_SECTOR_SIZE: u32 = 4096;
/// Flash reserved for user code (256 KiB)
pub const USER_CODE_LEN: u32 = FLASH_PAGE_SIZE * 1024;
/// Flash reserved for user data
pub const USER_DATA_LEN: u32 = FLASH_SECTOR_SIZE * 4;
/// Offset of the MAC session context region from the start of flash
pub const LORAWAN_NVM_OFFSET: u32 = USER_CODE_LEN + USER_DATA_LEN;

/// NVM error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvmError {
    /// Access outside the managed region
    OutOfBounds {
        /// Requested offset within the region
        offset: usize,
        /// Requested length
        len: usize,
    },
    /// Region geometry does not match the flash device
    InvalidLayout,
    /// Erase, program or read failed in the flash driver
    Flash(NorFlashErrorKind),
}

impl NvmError {
    pub(crate) fn from_flash<E: NorFlashError>(error: E) -> Self {
        NvmError::Flash(error.kind())
    }
}

/// Write-back behaviour of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WritePolicy {
    /// Every write erases and reprograms its sector immediately
    WriteThrough,
    /// Writes stay in the sector cache until `flush`
    Deferred,
}

/// Placement of the managed region inside the flash device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashLayout {
    /// Offset from the start of flash, sector aligned
    pub offset: u32,
    /// Region length, a whole number of sectors
    pub len: u32,
    /// Program page size
    pub page_size: u32,
}

impl FlashLayout {
    /// One sector for the MAC session context, after user code and data
    pub const fn lorawan_nvm() -> Self {
        Self {
            offset: LORAWAN_NVM_OFFSET,
            len: FLASH_SECTOR_SIZE,
            page_size: FLASH_PAGE_SIZE,
        }
    }

    /// `len` bytes at the top of a `flash_size` device, for EEPROM emulation
    pub const fn top_of_flash(flash_size: u32, len: u32) -> Self {
        Self {
            offset: flash_size.saturating_sub(len),
            len,
            page_size: FLASH_PAGE_SIZE,
        }
    }
}

impl Default for FlashLayout {
    fn default() -> Self {
        Self::lorawan_nvm()
    }
}

/// In-use flag of a deferred flush
///
/// The store raises it for the duration of every erase and reprogram cycle.
/// A board shutdown or low-power hook holding a shared reference can wait it
/// out before cutting power:
///
/// ```ignore
/// nb::block!(MONITOR.wait_idle()).ok();
/// ```
pub struct FlushMonitor {
    in_use: AtomicBool,
}

impl FlushMonitor {
    /// Create an idle monitor
    pub const fn new() -> Self {
        Self {
            in_use: AtomicBool::new(false),
        }
    }

    /// Whether a flush is in flight
    pub fn is_busy(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }

    /// Non-blocking wait for the in-flight flush to finish
    pub fn wait_idle(&self) -> nb::Result<(), Infallible> {
        if self.is_busy() {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    pub(crate) fn begin(&self) {
        self.in_use.store(true, Ordering::Release);
    }

    pub(crate) fn end(&self) {
        self.in_use.store(false, Ordering::Release);
    }
}

impl Default for FlushMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte-addressable persistent storage used by the MAC engine
pub trait NvmStorage {
    /// Read `buf.len()` bytes at `offset`
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), NvmError>;

    /// Write `data` at `offset`
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), NvmError>;

    /// Write back any cached data
    fn flush(&mut self) -> Result<(), NvmError>;

    /// Erase the whole managed region
    fn erase_all(&mut self) -> Result<(), NvmError>;

    /// Size of the managed region in bytes
    fn capacity(&self) -> usize;
}
