use heapless::Vec;

use super::handler::MacHandler;
use super::region::{DataRate, Region};
use crate::config::device::DeviceClass;

/// Maximum application payload size
pub const MAX_APP_PAYLOAD: usize = 242;

/// Maximum tolerated receive window error in milliseconds
pub const SYSTEM_MAX_RX_ERROR_MS: u32 = 20;

/// Default class B ping slot periodicity (2^7 seconds)
pub const DEFAULT_PING_SLOT_PERIODICITY: u8 = 7;

/// Firmware version reported through the compliance package
pub const FIRMWARE_VERSION: u32 = 0x0100_0000;

/// Application payload with its port
///
/// Port 0 is reserved for MAC commands and doubles as "no message".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppData {
    /// Application port, 0 when empty
    pub port: u8,
    /// Payload bytes
    pub payload: Vec<u8, MAX_APP_PAYLOAD>,
}

impl AppData {
    /// Empty message
    pub const fn empty() -> Self {
        Self {
            port: 0,
            payload: Vec::new(),
        }
    }

    /// Whether this slot holds no message
    pub fn is_empty(&self) -> bool {
        self.port == 0
    }
}

/// Uplink message type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MsgType {
    /// No acknowledgement requested
    Unconfirmed,
    /// Acknowledgement requested
    Confirmed,
}

/// Status reported by the MAC engine for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacStatus {
    /// Request accepted
    Ok,
    /// The MAC is busy with another request
    Busy,
    /// Request parameters are invalid
    ParameterInvalid,
    /// Device has not joined a network yet
    NoNetworkJoined,
    /// Payload does not fit the current data rate
    LengthError,
    /// Transmission is blocked by the duty cycle
    DutyCycleRestricted,
    /// No enabled channel is available
    NoChannelFound,
    /// Any other engine failure
    Error,
}

/// Parameters handed to the engine at initialization
#[derive(Debug, Clone, PartialEq)]
pub struct MacParams {
    /// Active region
    pub region: Region,
    /// Adaptive data rate enabled
    pub adr_enable: bool,
    /// Default uplink type
    pub tx_msg_type: MsgType,
    /// Data rate used when ADR is off
    pub tx_datarate: DataRate,
    /// Public network sync word
    pub public_network: bool,
    /// Regulatory duty cycle enforcement
    pub duty_cycle_enabled: bool,
    /// Size of the application data buffer
    pub data_buffer_max_size: usize,
    /// Class B ping slot periodicity
    pub ping_slot_periodicity: u8,
}

impl Default for MacParams {
    fn default() -> Self {
        Self {
            region: Region::US915,
            adr_enable: true,
            tx_msg_type: MsgType::Unconfirmed,
            tx_datarate: DataRate::DR0,
            public_network: true,
            duty_cycle_enabled: true,
            data_buffer_max_size: MAX_APP_PAYLOAD,
            ping_slot_periodicity: DEFAULT_PING_SLOT_PERIODICITY,
        }
    }
}

/// LoRa-Alliance compliance package parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplianceParams {
    /// Firmware version reported to the test harness
    pub fw_version: u32,
}

impl Default for ComplianceParams {
    fn default() -> Self {
        Self {
            fw_version: FIRMWARE_VERSION,
        }
    }
}

/// External LoRaWAN MAC engine
///
/// Implementations signal "call `process` again" by notifying the
/// [`PendingWorkFlag`](crate::sync::PendingWorkFlag) shared with the event
/// loop, typically from radio or timer interrupt context. Everything else is
/// reported through the [`MacHandler`] passed into the calls below, on the
/// main loop.
pub trait MacEngine {
    /// Error type for initialization
    type Error;

    /// Initialize the engine
    ///
    /// The engine requests network parameters from the handler and restores
    /// its context from the handler's NVM storage during this call.
    fn init(&mut self, params: &MacParams, handler: &mut dyn MacHandler) -> Result<(), Self::Error>;

    /// Set the maximum tolerated receive window error
    fn set_system_max_rx_error(&mut self, max_rx_error_ms: u32);

    /// Register and activate the compliance protocol package
    fn register_compliance(&mut self, params: &ComplianceParams) -> Result<(), Self::Error>;

    /// Run one iteration of the engine's processing routine
    fn process(&mut self, handler: &mut dyn MacHandler);

    /// Start (or restart) the join procedure
    fn join(&mut self);

    /// Whether the device has joined a network
    fn is_joined(&self) -> bool;

    /// Queue an uplink
    fn send(&mut self, data: &AppData, msg_type: MsgType) -> Result<(), MacStatus>;

    /// Switch device class
    fn request_class(&mut self, class: DeviceClass) -> Result<(), MacStatus>;

    /// Reset the stored MAC context to factory defaults
    fn factory_reset(&mut self, handler: &mut dyn MacHandler) -> bool;
}
