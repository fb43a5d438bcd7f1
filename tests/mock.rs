#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::spi::{Transfer, Write};
use embedded_hal::digital::v2::OutputPin;
use embedded_storage::nor_flash::{ErrorType, NorFlash, NorFlashErrorKind, ReadNorFlash};

use pico_lorawan::{
    board::Platform,
    config::device::DeviceClass,
    lorawan::{
        handler::{
            CommissioningParams, JoinParams, MacHandler, NvmContextState, RxParams, TxParams,
        },
        mac::{AppData, ComplianceParams, MacEngine, MacParams, MacStatus, MsgType},
        region::DataRate,
    },
    nvm::FlushMonitor,
    radio::{
        irq::{Edges, GpioIrq},
        traits::{RadioBoard, SX127X_VERSION},
    },
    sync::PendingWorkFlag,
    timer::{AlarmId, AlarmTimer, Clock, Instant},
};

// ---------------------------------------------------------------------------
// Flash

/// NOR flash in RAM: erase sets 0xFF, program can only clear bits
pub struct MockFlash {
    pub mem: Vec<u8>,
    pub erases: Vec<(u32, u32)>,
    pub writes: Vec<(u32, usize)>,
    pub fail_erase: bool,
    pub fail_write: bool,
    pub monitor: Option<&'static FlushMonitor>,
    /// Monitor state observed at every erase or program
    pub busy_seen: Vec<bool>,
}

impl MockFlash {
    pub const SIZE: usize = 2 * 1024 * 1024;

    pub fn new() -> Self {
        Self::with_size(Self::SIZE)
    }

    pub fn with_size(size: usize) -> Self {
        Self {
            mem: vec![0xFF; size],
            erases: Vec::new(),
            writes: Vec::new(),
            fail_erase: false,
            fail_write: false,
            monitor: None,
            busy_seen: Vec::new(),
        }
    }

    pub fn bytes(&self, offset: u32, len: usize) -> &[u8] {
        &self.mem[offset as usize..offset as usize + len]
    }

    fn observe(&mut self) {
        if let Some(monitor) = self.monitor {
            self.busy_seen.push(monitor.is_busy());
        }
    }
}

impl ErrorType for MockFlash {
    type Error = NorFlashErrorKind;
}

impl ReadNorFlash for MockFlash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let end = start + bytes.len();
        if end > self.mem.len() {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        bytes.copy_from_slice(&self.mem[start..end]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.mem.len()
    }
}

impl NorFlash for MockFlash {
    const WRITE_SIZE: usize = 256;
    const ERASE_SIZE: usize = 4096;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        self.observe();
        if self.fail_erase {
            return Err(NorFlashErrorKind::Other);
        }
        if from as usize % Self::ERASE_SIZE != 0 || to as usize % Self::ERASE_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        if to as usize > self.mem.len() || from > to {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        self.mem[from as usize..to as usize].fill(0xFF);
        self.erases.push((from, to));
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        self.observe();
        if self.fail_write {
            return Err(NorFlashErrorKind::Other);
        }
        if offset as usize % Self::WRITE_SIZE != 0 || bytes.len() % Self::WRITE_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        let start = offset as usize;
        if start + bytes.len() > self.mem.len() {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        for (cell, byte) in self.mem[start..start + bytes.len()].iter_mut().zip(bytes) {
            *cell &= *byte;
        }
        self.writes.push((offset, bytes.len()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Time

/// Microsecond clock shared between the platform and the mocks
#[derive(Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_us(&self, us: u64) {
        self.0.set(us);
    }

    pub fn advance_us(&self, us: u64) {
        self.0.set(self.0.get() + us);
    }

    pub fn now_us(&self) -> u64 {
        self.0.get()
    }
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.0.get())
    }
}

/// Board whose idle wait jumps straight to the next scheduled wake-up
pub struct SimPlatform {
    pub clock: SimClock,
    /// Times at which a hardware event wakes the processor
    pub wakeups: Vec<u64>,
    /// Extra delay added to every wait, as seen on real hardware
    pub wake_latency_us: u64,
    pub waits: usize,
    pub id: [u8; 8],
}

impl SimPlatform {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            wakeups: Vec::new(),
            wake_latency_us: 0,
            waits: 0,
            id: [0xE6, 0x60, 0x58, 0x38, 0x83, 0x1A, 0x2B, 0x27],
        }
    }
}

impl Clock for SimPlatform {
    fn now(&self) -> Instant {
        self.clock.now()
    }
}

impl Platform for SimPlatform {
    fn wait_for_event_until(&mut self, deadline: Instant) -> bool {
        self.waits += 1;
        let now = self.clock.now_us();
        let wake = self
            .wakeups
            .iter()
            .copied()
            .filter(|&t| t > now)
            .min()
            .unwrap_or(u64::MAX)
            .min(deadline.as_micros());
        self.clock.set_us(wake.max(now) + self.wake_latency_us);
        self.clock.now() >= deadline
    }

    fn unique_id(&self) -> [u8; 8] {
        self.id
    }
}

/// Alarm bookkeeping visible to the test while the scheduler owns the timer
#[derive(Default)]
pub struct AlarmLog {
    pub next_id: u32,
    pub active: Vec<(AlarmId, u64)>,
    pub cancelled: Vec<AlarmId>,
    pub exhausted: bool,
}

pub struct MockAlarmTimer {
    pub clock: SimClock,
    pub log: Rc<RefCell<AlarmLog>>,
}

impl MockAlarmTimer {
    pub fn new(clock: SimClock) -> (Self, Rc<RefCell<AlarmLog>>) {
        let log = Rc::new(RefCell::new(AlarmLog::default()));
        (
            Self {
                clock,
                log: log.clone(),
            },
            log,
        )
    }
}

impl AlarmTimer for MockAlarmTimer {
    fn now_us(&self) -> u64 {
        self.clock.now_us()
    }

    fn add_alarm_at(&mut self, at_us: u64) -> Option<AlarmId> {
        let mut log = self.log.borrow_mut();
        if log.exhausted {
            return None;
        }
        log.next_id += 1;
        let id = AlarmId(log.next_id);
        log.active.push((id, at_us));
        Some(id)
    }

    fn cancel_alarm(&mut self, id: AlarmId) {
        let mut log = self.log.borrow_mut();
        log.active.retain(|(active, _)| *active != id);
        log.cancelled.push(id);
    }
}

// ---------------------------------------------------------------------------
// MAC engine

/// Scripted MAC engine
///
/// Join results and downlinks are delivered by `process` once the shared
/// clock reaches their scheduled time.
pub struct MockMac {
    pub clock: SimClock,
    pub pending: Option<&'static PendingWorkFlag>,
    pub joined: bool,
    pub join_calls: usize,
    /// Outcome of each join attempt, in order; attempts past the end succeed
    pub join_results: Vec<bool>,
    pub join_delay_us: u64,
    join_due: Option<u64>,
    pub downlinks: Vec<(u64, u8, Vec<u8>)>,
    pub sent: Vec<(AppData, MsgType)>,
    pub send_result: Result<(), MacStatus>,
    pub class_requests: Vec<DeviceClass>,
    class_due: Option<DeviceClass>,
    pub init_params: Option<MacParams>,
    pub commissioning: Option<CommissioningParams>,
    pub init_fails: bool,
    pub max_rx_error: Option<u32>,
    pub compliance: Option<ComplianceParams>,
    pub factory_reset_ok: bool,
    pub process_calls: usize,
    /// Number of upcoming `process` calls that notify the pending flag
    pub notify_for: usize,
}

impl MockMac {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            pending: None,
            joined: false,
            join_calls: 0,
            join_results: Vec::new(),
            join_delay_us: 0,
            join_due: None,
            downlinks: Vec::new(),
            sent: Vec::new(),
            send_result: Ok(()),
            class_requests: Vec::new(),
            class_due: None,
            init_params: None,
            commissioning: None,
            init_fails: false,
            max_rx_error: None,
            compliance: None,
            factory_reset_ok: true,
            process_calls: 0,
            notify_for: 0,
        }
    }

    pub fn schedule_downlink(&mut self, at_us: u64, port: u8, payload: &[u8]) {
        self.downlinks.push((at_us, port, payload.to_vec()));
    }
}

impl MacEngine for MockMac {
    type Error = MacStatus;

    fn init(&mut self, params: &MacParams, handler: &mut dyn MacHandler) -> Result<(), MacStatus> {
        if self.init_fails {
            return Err(MacStatus::Error);
        }
        self.init_params = Some(params.clone());

        let mut context = [0u8; 16];
        handler
            .nvm()
            .read(0, &mut context)
            .map_err(|_| MacStatus::Error)?;
        handler.on_nvm_data_change(NvmContextState::Restored, context.len() as u16);

        let mut commissioning = CommissioningParams::default();
        handler.on_network_parameters_change(&mut commissioning);
        self.commissioning = Some(commissioning);
        Ok(())
    }

    fn set_system_max_rx_error(&mut self, max_rx_error_ms: u32) {
        self.max_rx_error = Some(max_rx_error_ms);
    }

    fn register_compliance(&mut self, params: &ComplianceParams) -> Result<(), MacStatus> {
        self.compliance = Some(*params);
        Ok(())
    }

    fn process(&mut self, handler: &mut dyn MacHandler) {
        self.process_calls += 1;
        let now = self.clock.now_us();

        if let Some(due) = self.join_due {
            if now >= due {
                self.join_due = None;
                let attempt = self.join_calls - 1;
                let success = self.join_results.get(attempt).copied().unwrap_or(true);
                self.joined = success;
                handler.on_join_request(&JoinParams {
                    success,
                    is_otaa: true,
                    datarate: DataRate::DR0,
                });
            }
        }

        if let Some(class) = self.class_due.take() {
            handler.on_class_change(class);
        }

        if let Some(index) = self.downlinks.iter().position(|(at, _, _)| now >= *at) {
            let (_, port, payload) = self.downlinks.remove(index);
            let mut data = AppData::empty();
            data.port = port;
            data.payload.extend_from_slice(&payload).unwrap();
            handler.on_rx_data(
                &data,
                &RxParams {
                    status: MacStatus::Ok,
                    downlink_counter: 1,
                    datarate: DataRate::DR0,
                    rssi: -80,
                    snr: 7,
                    rx_slot: 0,
                },
            );
        }

        if self.notify_for > 0 {
            self.notify_for -= 1;
            if let Some(pending) = self.pending {
                pending.notify();
            }
        }
    }

    fn join(&mut self) {
        self.join_calls += 1;
        self.join_due = Some(self.clock.now_us() + self.join_delay_us);
    }

    fn is_joined(&self) -> bool {
        self.joined
    }

    fn send(&mut self, data: &AppData, msg_type: MsgType) -> Result<(), MacStatus> {
        self.send_result?;
        self.sent.push((data.clone(), msg_type));
        Ok(())
    }

    fn request_class(&mut self, class: DeviceClass) -> Result<(), MacStatus> {
        self.class_requests.push(class);
        self.class_due = Some(class);
        Ok(())
    }

    fn factory_reset(&mut self, handler: &mut dyn MacHandler) -> bool {
        if !self.factory_reset_ok {
            return false;
        }
        if handler.nvm().write(0, &[0u8; 16]).is_err() {
            return false;
        }
        handler.on_nvm_data_change(NvmContextState::Stored, 16);
        true
    }
}

/// Uplink summary used by callback tests
pub fn tx_params() -> TxParams {
    TxParams {
        status: MacStatus::Ok,
        msg_type: MsgType::Unconfirmed,
        ack_received: false,
        uplink_counter: 0,
        datarate: DataRate::DR0,
        tx_power: 0,
        channel: 0,
    }
}

// ---------------------------------------------------------------------------
// Radio

/// Register-level radio stand-in
pub struct MockRadio {
    pub registers: [u8; 128],
    pub io_initialised: bool,
    pub resets: usize,
}

impl MockRadio {
    pub fn new() -> Self {
        Self::with_version(SX127X_VERSION)
    }

    pub fn with_version(version: u8) -> Self {
        let mut registers = [0u8; 128];
        registers[0x42] = version;
        Self {
            registers,
            io_initialised: false,
            resets: 0,
        }
    }
}

impl RadioBoard for MockRadio {
    type Error = Infallible;

    fn io_init(&mut self) -> Result<(), Self::Error> {
        self.io_initialised = true;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.resets += 1;
        Ok(())
    }

    fn read_register(&mut self, addr: u8) -> Result<u8, Self::Error> {
        Ok(self.registers[usize::from(addr & 0x7F)])
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Self::Error> {
        self.registers[usize::from(addr & 0x7F)] = value;
        Ok(())
    }
}

/// Bus activity seen by the SPI, pin and delay mocks, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    NssLow,
    NssHigh,
    ResetLow,
    ResetHigh,
    DelayMs(u8),
    Write(Vec<u8>),
    Transfer(usize),
}

/// SX127x register file behind a shared bus log
#[derive(Default)]
pub struct Bus {
    pub events: Vec<BusEvent>,
    pub registers: Vec<u8>,
    addr: Option<u8>,
}

pub type SharedBus = Rc<RefCell<Bus>>;

pub fn shared_bus() -> SharedBus {
    Rc::new(RefCell::new(Bus {
        events: Vec::new(),
        registers: vec![0; 128],
        addr: None,
    }))
}

pub struct MockSpi(pub SharedBus);

impl Write<u8> for MockSpi {
    type Error = Infallible;

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut bus = self.0.borrow_mut();
        bus.events.push(BusEvent::Write(words.to_vec()));
        let current = bus.addr;
        let data = match current {
            None => {
                bus.addr = words.first().copied();
                &words[1.min(words.len())..]
            }
            Some(_) => words,
        };
        if let Some(addr) = bus.addr {
            if addr & 0x80 != 0 {
                let base = usize::from(addr & 0x7F);
                bus.registers[base..base + data.len()].copy_from_slice(data);
            }
        }
        Ok(())
    }
}

impl Transfer<u8> for MockSpi {
    type Error = Infallible;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        let mut bus = self.0.borrow_mut();
        bus.events.push(BusEvent::Transfer(words.len()));
        if let Some(addr) = bus.addr {
            let base = usize::from(addr & 0x7F);
            for (i, word) in words.iter_mut().enumerate() {
                *word = bus.registers[base + i];
            }
        }
        Ok(words)
    }
}

pub struct MockNss(pub SharedBus);

impl OutputPin for MockNss {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().events.push(BusEvent::NssLow);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut bus = self.0.borrow_mut();
        bus.events.push(BusEvent::NssHigh);
        bus.addr = None;
        Ok(())
    }
}

pub struct MockReset(pub SharedBus);

impl OutputPin for MockReset {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().events.push(BusEvent::ResetLow);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().events.push(BusEvent::ResetHigh);
        Ok(())
    }
}

pub struct MockDelay(pub SharedBus);

impl DelayMs<u8> for MockDelay {
    fn delay_ms(&mut self, ms: u8) {
        self.0.borrow_mut().events.push(BusEvent::DelayMs(ms));
    }
}

/// GPIO controller recording enabled interrupts
#[derive(Default)]
pub struct MockGpio {
    pub enabled: Vec<(u8, Edges)>,
}

impl GpioIrq for MockGpio {
    fn enable_irq(&mut self, pin: u8, edges: Edges) {
        self.enabled.push((pin, edges));
    }
}
