use super::mac::{AppData, MacStatus, MsgType};
use super::region::DataRate;
use crate::config::device::{AESKey, ChannelMask, DevAddr, DeviceClass, EUI64};
use crate::nvm::NvmStorage;

/// LoRaWAN version announced for ABP sessions (1.0.3)
pub const ABP_ACTIVATION_LRWAN_VERSION: u32 = 0x0100_0300;

/// Network identifier used for ABP sessions
pub const LORAWAN_NETWORK_ID: u32 = 0;

/// Direction of an NVM context change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NvmContextState {
    /// Context was written to NVM
    Stored,
    /// Context was read back from NVM
    Restored,
}

/// Network parameters requested by the engine
///
/// The handler fills in what the active activation settings provide; fields
/// left `None` keep the engine's defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommissioningParams {
    /// Over-the-air activation selected
    pub is_otaa: bool,
    /// Device EUI
    pub dev_eui: Option<EUI64>,
    /// Join (application) EUI
    pub join_eui: Option<EUI64>,
    /// Application root key
    pub app_key: Option<AESKey>,
    /// Network root key
    pub nwk_key: Option<AESKey>,
    /// LoRaWAN version of an ABP network server
    pub abp_lrwan_version: Option<u32>,
    /// Network identifier
    pub net_id: Option<u32>,
    /// Device address
    pub dev_addr: Option<DevAddr>,
    /// Application session key
    pub app_s_key: Option<AESKey>,
    /// Forwarding network session integrity key
    pub f_nwk_s_int_key: Option<AESKey>,
    /// Serving network session integrity key
    pub s_nwk_s_int_key: Option<AESKey>,
    /// Network session encryption key
    pub nwk_s_enc_key: Option<AESKey>,
    /// Active channel mask
    pub channel_mask: Option<ChannelMask>,
    /// Default channel mask
    pub channel_default_mask: Option<ChannelMask>,
}

/// Kind of data request reported through `on_mcps_request`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum McpsRequest {
    /// Unconfirmed uplink
    Unconfirmed,
    /// Confirmed uplink
    Confirmed,
    /// Proprietary frame
    Proprietary,
}

/// Kind of management request reported through `on_mlme_request`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MlmeRequest {
    /// Join request
    Join,
    /// Link check request
    LinkCheck,
    /// Device time request
    DeviceTime,
    /// Ping slot info request
    PingSlotInfo,
    /// Beacon acquisition
    BeaconAcquisition,
}

/// Result of a join attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinParams {
    /// Whether the join succeeded
    pub success: bool,
    /// Activation used
    pub is_otaa: bool,
    /// Data rate of the join request
    pub datarate: DataRate,
}

/// Summary of a completed uplink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxParams {
    /// Engine status for the uplink
    pub status: MacStatus,
    /// Message type sent
    pub msg_type: MsgType,
    /// Whether a confirmed uplink was acknowledged
    pub ack_received: bool,
    /// Uplink frame counter
    pub uplink_counter: u32,
    /// Data rate used
    pub datarate: DataRate,
    /// Transmit power index
    pub tx_power: i8,
    /// Channel index
    pub channel: u8,
}

/// Metadata of a received downlink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxParams {
    /// Engine status for the downlink
    pub status: MacStatus,
    /// Downlink frame counter
    pub downlink_counter: u32,
    /// Data rate of the downlink
    pub datarate: DataRate,
    /// Received signal strength in dBm
    pub rssi: i16,
    /// Signal to noise ratio in dB
    pub snr: i8,
    /// Receive slot index (0 = RX1, 1 = RX2, ...)
    pub rx_slot: u8,
}

/// Class B beacon tracking state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BeaconState {
    /// Beacon acquired
    Acquired,
    /// Beacon received
    Received,
    /// Beacon not received in the expected slot
    NotReceived,
    /// Beacon tracking lost
    Lost,
}

/// Callbacks through which the MAC engine reports to the platform layer
///
/// All methods run on the main loop, from inside `MacEngine::init`,
/// `MacEngine::process` or `MacEngine::factory_reset`.
pub trait MacHandler {
    /// Storage holding the engine's persistent context
    fn nvm(&mut self) -> &mut dyn NvmStorage;

    /// The engine stored or restored its context
    fn on_nvm_data_change(&mut self, state: NvmContextState, size: u16);

    /// The engine asks for the network parameters to use
    fn on_network_parameters_change(&mut self, params: &mut CommissioningParams);

    /// A data request was issued
    fn on_mcps_request(&mut self, status: MacStatus, request: McpsRequest, next_tx_in_ms: u32);

    /// A management request was issued
    fn on_mlme_request(&mut self, status: MacStatus, request: MlmeRequest, next_tx_in_ms: u32);

    /// A join attempt finished
    fn on_join_request(&mut self, params: &JoinParams);

    /// An uplink finished
    fn on_tx_data(&mut self, params: &TxParams);

    /// A downlink with application data arrived
    fn on_rx_data(&mut self, data: &AppData, params: &RxParams);

    /// The device class changed
    fn on_class_change(&mut self, class: DeviceClass);

    /// Class B beacon state changed
    fn on_beacon_status_change(&mut self, state: BeaconState);

    /// Network time synchronisation update
    fn on_sys_time_update(&mut self, synchronized: bool, correction: i32);

    /// Compliance package changed the uplink periodicity
    fn on_tx_periodicity_changed(&mut self, periodicity_ms: u32);

    /// Compliance package changed the uplink message type
    fn on_tx_frame_ctrl_changed(&mut self, msg_type: MsgType);

    /// Compliance package changed the ping slot periodicity
    fn on_ping_slot_periodicity_changed(&mut self, periodicity: u8);
}
