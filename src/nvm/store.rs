//! Sector-cached NOR flash store
//!
//! A write transaction:
//! 1. copy the containing sector from flash into the shadow buffer
//! 2. apply the byte changes in memory
//! 3. erase the sector
//! 4. program every page of the sector from the shadow buffer
//!
//! Steps 3 and 4 run with interrupts disabled: the processor executes from
//! the same flash device, so nothing may fetch from it mid-cycle.

use embedded_storage::nor_flash::NorFlash;

use super::{FlashLayout, FlushMonitor, NvmError, NvmStorage, WritePolicy};
use crate::sync::CriticalSectionGuard;

/// In-memory mirror of one flash sector
struct SectorCache<const SECTOR: usize> {
    data: [u8; SECTOR],
    /// Offset of the mirrored sector within the region
    sector: Option<usize>,
    dirty: bool,
}

impl<const SECTOR: usize> SectorCache<SECTOR> {
    const fn new() -> Self {
        Self {
            data: [0xFF; SECTOR],
            sector: None,
            dirty: false,
        }
    }

    fn holds(&self, sector: usize) -> bool {
        self.sector == Some(sector)
    }

    fn discard(&mut self) {
        self.sector = None;
        self.dirty = false;
    }
}

/// Byte-addressable store over a fixed flash region
///
/// `SECTOR` is the erase sector size and must be a multiple of the flash
/// driver's `ERASE_SIZE`.
pub struct FlashNvmStore<'m, F, const SECTOR: usize = 4096> {
    flash: F,
    layout: FlashLayout,
    policy: WritePolicy,
    cache: SectorCache<SECTOR>,
    monitor: Option<&'m FlushMonitor>,
}

impl<'m, F: NorFlash, const SECTOR: usize> FlashNvmStore<'m, F, SECTOR> {
    /// Create a store over `layout`, validating it against the flash driver
    pub fn new(flash: F, layout: FlashLayout, policy: WritePolicy) -> Result<Self, NvmError> {
        let offset = layout.offset as usize;
        let len = layout.len as usize;
        let page = layout.page_size as usize;

        let valid = F::READ_SIZE == 1
            && SECTOR > 0
            && SECTOR % F::ERASE_SIZE == 0
            && page > 0
            && SECTOR % page == 0
            && page % F::WRITE_SIZE == 0
            && offset % SECTOR == 0
            && len > 0
            && len % SECTOR == 0
            && offset
                .checked_add(len)
                .map_or(false, |end| end <= flash.capacity());
        if !valid {
            return Err(NvmError::InvalidLayout);
        }

        Ok(Self {
            flash,
            layout,
            policy,
            cache: SectorCache::new(),
            monitor: None,
        })
    }

    /// Report flush activity through `monitor`
    pub fn with_monitor(mut self, monitor: &'m FlushMonitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Region placement
    pub fn layout(&self) -> FlashLayout {
        self.layout
    }

    /// Active write-back policy
    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Whether cached writes are waiting for `flush`
    pub fn is_dirty(&self) -> bool {
        self.cache.dirty
    }

    /// Size of the managed region in bytes
    pub fn capacity(&self) -> usize {
        self.layout.len as usize
    }

    /// Give back the flash driver; unflushed writes are lost
    pub fn release(self) -> F {
        self.flash
    }

    /// Read `buf.len()` bytes at `offset`
    ///
    /// Flash is byte-readable, so this is a straight copy, overlaid with the
    /// sector cache when it holds unflushed writes.
    pub fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), NvmError> {
        self.check_bounds(offset, buf.len())?;
        self.flash
            .read(self.absolute(offset), buf)
            .map_err(NvmError::from_flash)?;

        if let (true, Some(sector)) = (self.cache.dirty, self.cache.sector) {
            let start = offset.max(sector);
            let end = (offset + buf.len()).min(sector + SECTOR);
            if start < end {
                buf[start - offset..end - offset]
                    .copy_from_slice(&self.cache.data[start - sector..end - sector]);
            }
        }
        Ok(())
    }

    /// Write `data` at `offset`
    ///
    /// Write-through commits each touched sector before returning. Deferred
    /// keeps the change in the cache; touching another sector writes the
    /// cached one back first.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), NvmError> {
        self.check_bounds(offset, data.len())?;

        let mut done = 0;
        while done < data.len() {
            let at = offset + done;
            let sector = at - at % SECTOR;
            let within = at - sector;
            let chunk = (SECTOR - within).min(data.len() - done);

            self.load_sector(sector)?;
            self.cache.data[within..within + chunk].copy_from_slice(&data[done..done + chunk]);
            self.cache.dirty = true;

            if self.policy == WritePolicy::WriteThrough {
                self.commit()?;
            }
            done += chunk;
        }
        Ok(())
    }

    /// Write back the cached sector, if dirty
    ///
    /// On failure the cache stays dirty so the caller can retry.
    pub fn flush(&mut self) -> Result<(), NvmError> {
        self.commit()
    }

    /// Erase the whole region without reading it back
    pub fn erase_all(&mut self) -> Result<(), NvmError> {
        self.cache.discard();

        let from = self.layout.offset;
        let to = from + self.layout.len;
        self.begin_flush();
        let result = {
            let _cs = CriticalSectionGuard::enter();
            self.flash.erase(from, to)
        };
        self.end_flush();

        result.map_err(|e| {
            log::warn!("nvm: erase of {:#x}..{:#x} failed", from, to);
            NvmError::from_flash(e)
        })
    }

    fn check_bounds(&self, offset: usize, len: usize) -> Result<(), NvmError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.capacity() => Ok(()),
            _ => Err(NvmError::OutOfBounds { offset, len }),
        }
    }

    fn absolute(&self, offset: usize) -> u32 {
        self.layout.offset + offset as u32
    }

    /// Make the cache mirror `sector`, writing back another dirty sector first
    fn load_sector(&mut self, sector: usize) -> Result<(), NvmError> {
        if self.cache.holds(sector) {
            return Ok(());
        }
        self.commit()?;

        let from = self.absolute(sector);
        self.flash
            .read(from, &mut self.cache.data)
            .map_err(NvmError::from_flash)?;
        self.cache.sector = Some(sector);
        self.cache.dirty = false;
        Ok(())
    }

    /// Erase and reprogram the cached sector, then drop the cache
    fn commit(&mut self) -> Result<(), NvmError> {
        let sector = match self.cache.sector {
            Some(sector) if self.cache.dirty => sector,
            _ => {
                self.cache.discard();
                return Ok(());
            }
        };

        self.begin_flush();
        let result = self.program_sector(sector);
        self.end_flush();

        match result {
            Ok(()) => {
                self.cache.discard();
                Ok(())
            }
            Err(e) => {
                log::warn!("nvm: commit of sector {:#x} failed: {:?}", sector, e);
                Err(e)
            }
        }
    }

    fn program_sector(&mut self, sector: usize) -> Result<(), NvmError> {
        let base = self.absolute(sector);
        let page_size = self.layout.page_size as usize;

        let _cs = CriticalSectionGuard::enter();
        self.flash
            .erase(base, base + SECTOR as u32)
            .map_err(NvmError::from_flash)?;
        for (i, page) in self.cache.data.chunks(page_size).enumerate() {
            self.flash
                .write(base + (i * page_size) as u32, page)
                .map_err(NvmError::from_flash)?;
        }
        Ok(())
    }

    fn begin_flush(&self) {
        if let Some(monitor) = self.monitor {
            monitor.begin();
        }
    }

    fn end_flush(&self) {
        if let Some(monitor) = self.monitor {
            monitor.end();
        }
    }
}

impl<F: NorFlash, const SECTOR: usize> NvmStorage for FlashNvmStore<'_, F, SECTOR> {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), NvmError> {
        FlashNvmStore::read(self, offset, buf)
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), NvmError> {
        FlashNvmStore::write(self, offset, data)
    }

    fn flush(&mut self) -> Result<(), NvmError> {
        FlashNvmStore::flush(self)
    }

    fn erase_all(&mut self) -> Result<(), NvmError> {
        FlashNvmStore::erase_all(self)
    }

    fn capacity(&self) -> usize {
        FlashNvmStore::capacity(self)
    }
}
