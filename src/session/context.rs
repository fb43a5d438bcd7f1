use heapless::Vec;

use super::buffer::UplinkDownlinkBuffer;
use crate::config::device::{ActivationSettings, DeviceClass};
use crate::lorawan::handler::{
    BeaconState, CommissioningParams, JoinParams, MacHandler, McpsRequest, MlmeRequest,
    NvmContextState, RxParams, TxParams,
};
use crate::lorawan::mac::{
    AppData, MacEngine, MacParams, MacStatus, MsgType, DEFAULT_PING_SLOT_PERIODICITY,
};
use crate::lorawan::region::Region;
use crate::nvm::NvmStorage;

/// Class requested once a join succeeds
pub const DEFAULT_CLASS: DeviceClass = DeviceClass::A;

/// Engine request queued from a callback, issued after `process` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Restart the join procedure
    Join,
    /// Switch to the given class
    RequestClass(DeviceClass),
    /// Send an empty unconfirmed uplink
    SendEmpty,
}

/// State shared between the application and the MAC engine callbacks
pub struct SessionContext<S> {
    nvm: S,
    activation: Option<ActivationSettings>,
    random_seed: u32,
    debug: bool,
    buffers: UplinkDownlinkBuffer,
    follow_ups: Vec<FollowUp, 4>,
    class: DeviceClass,
    tx_periodicity_ms: u32,
    tx_msg_type: MsgType,
    ping_slot_periodicity: u8,
}

impl<S: NvmStorage> SessionContext<S> {
    /// Create a session over `nvm`
    ///
    /// `random_seed` picks the ABP device address when none is configured.
    pub fn new(nvm: S, random_seed: u32) -> Self {
        Self {
            nvm,
            activation: None,
            random_seed,
            debug: false,
            buffers: UplinkDownlinkBuffer::new(),
            follow_ups: Vec::new(),
            class: DeviceClass::A,
            tx_periodicity_ms: 0,
            tx_msg_type: MsgType::Unconfirmed,
            ping_slot_periodicity: DEFAULT_PING_SLOT_PERIODICITY,
        }
    }

    /// Select the activation method, replacing any previous one
    pub fn set_activation(&mut self, activation: Option<ActivationSettings>) {
        self.activation = activation;
    }

    /// Active activation settings
    pub fn activation(&self) -> Option<&ActivationSettings> {
        self.activation.as_ref()
    }

    /// Log engine callbacks
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Whether engine callbacks are logged
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Application mailboxes
    pub fn buffers(&self) -> &UplinkDownlinkBuffer {
        &self.buffers
    }

    /// Application mailboxes, mutably
    pub fn buffers_mut(&mut self) -> &mut UplinkDownlinkBuffer {
        &mut self.buffers
    }

    /// Session context storage
    pub fn storage(&mut self) -> &mut S {
        &mut self.nvm
    }

    /// Last class reported by the engine
    pub fn class(&self) -> DeviceClass {
        self.class
    }

    /// Uplink periodicity requested by the compliance package, 0 if never set
    pub fn tx_periodicity_ms(&self) -> u32 {
        self.tx_periodicity_ms
    }

    /// Uplink type requested by the compliance package
    pub fn tx_msg_type(&self) -> MsgType {
        self.tx_msg_type
    }

    /// Class B ping slot periodicity
    pub fn ping_slot_periodicity(&self) -> u8 {
        self.ping_slot_periodicity
    }

    /// Engine parameters for `region`
    ///
    /// Carries the uplink type and ping slot periodicity last requested
    /// through the compliance callbacks into the next engine init.
    pub fn mac_params(&self, region: Region) -> MacParams {
        MacParams {
            region,
            tx_msg_type: self.tx_msg_type,
            ping_slot_periodicity: self.ping_slot_periodicity,
            ..MacParams::default()
        }
    }

    /// Requests queued by callbacks and not yet issued
    pub fn follow_ups(&self) -> &[FollowUp] {
        &self.follow_ups
    }

    /// Issue the queued requests to the engine, oldest first
    pub fn apply_follow_ups<M: MacEngine>(&mut self, mac: &mut M) {
        for follow_up in self.follow_ups.iter() {
            match *follow_up {
                FollowUp::Join => mac.join(),
                FollowUp::RequestClass(class) => {
                    if let Err(status) = mac.request_class(class) {
                        log::warn!("class {:?} request failed: {:?}", class, status);
                    }
                }
                FollowUp::SendEmpty => {
                    if let Err(status) = mac.send(&AppData::empty(), MsgType::Unconfirmed) {
                        log::warn!("empty uplink rejected: {:?}", status);
                    }
                }
            }
        }
        self.follow_ups.clear();
    }

    fn queue(&mut self, follow_up: FollowUp) {
        if self.follow_ups.contains(&follow_up) {
            return;
        }
        if self.follow_ups.push(follow_up).is_err() {
            log::warn!("follow-up queue full, dropping {:?}", follow_up);
        }
    }
}

impl<S: NvmStorage> MacHandler for SessionContext<S> {
    fn nvm(&mut self) -> &mut dyn NvmStorage {
        &mut self.nvm
    }

    fn on_nvm_data_change(&mut self, state: NvmContextState, size: u16) {
        if self.debug {
            match state {
                NvmContextState::Stored => log::info!("CONTEXT SAVED : {} bytes", size),
                NvmContextState::Restored => log::info!("CONTEXT RESTORED : {} bytes", size),
            }
        }
        if let Err(e) = self.nvm.flush() {
            log::warn!("session context flush failed: {:?}", e);
        }
    }

    fn on_network_parameters_change(&mut self, params: &mut CommissioningParams) {
        if let Some(activation) = &self.activation {
            activation.commission(params, self.random_seed);
        }
        if self.debug {
            log::info!("OTAA      : {}", params.is_otaa);
            if let Some(dev_eui) = params.dev_eui {
                log::info!("DevEui    : {:02X?}", dev_eui);
            }
            if let Some(join_eui) = params.join_eui {
                log::info!("JoinEui   : {:02X?}", join_eui);
            }
            if let Some(dev_addr) = params.dev_addr {
                log::info!("DevAddr   : {:08X}", dev_addr);
            }
        }
    }

    fn on_mcps_request(&mut self, status: MacStatus, request: McpsRequest, next_tx_in_ms: u32) {
        if self.debug {
            log::info!("MCPS-Request {:?}: {:?}", request, status);
            if status == MacStatus::DutyCycleRestricted {
                log::info!("Next Tx in  : {} [ms]", next_tx_in_ms);
            }
        }
    }

    fn on_mlme_request(&mut self, status: MacStatus, request: MlmeRequest, next_tx_in_ms: u32) {
        if self.debug {
            log::info!("MLME-Request {:?}: {:?}", request, status);
            if status == MacStatus::DutyCycleRestricted {
                log::info!("Next Tx in  : {} [ms]", next_tx_in_ms);
            }
        }
    }

    fn on_join_request(&mut self, params: &JoinParams) {
        if self.debug {
            if params.success {
                let mode = if params.is_otaa { "OTAA" } else { "ABP" };
                log::info!("JOINED, {} DR{}", mode, params.datarate.0);
            } else {
                log::info!("JOIN FAILED");
            }
        }

        if params.success {
            self.queue(FollowUp::RequestClass(DEFAULT_CLASS));
        } else {
            self.queue(FollowUp::Join);
        }
    }

    fn on_tx_data(&mut self, params: &TxParams) {
        if self.debug {
            log::info!(
                "UPLINK FRAME {} {:?} ack={} DR{} ch={} pwr={} status={:?}",
                params.uplink_counter,
                params.msg_type,
                params.ack_received,
                params.datarate.0,
                params.channel,
                params.tx_power,
                params.status,
            );
        }
    }

    fn on_rx_data(&mut self, data: &AppData, params: &RxParams) {
        if self.debug {
            log::info!(
                "DOWNLINK FRAME {} port={} size={} rx={} DR{} rssi={} snr={}",
                params.downlink_counter,
                data.port,
                data.payload.len(),
                params.rx_slot,
                params.datarate.0,
                params.rssi,
                params.snr,
            );
        }
        self.buffers.on_downlink_received(&data.payload, data.port);
    }

    fn on_class_change(&mut self, class: DeviceClass) {
        if self.debug {
            log::info!("Switch to Class {:?} done.", class);
        }
        self.class = class;
        self.queue(FollowUp::SendEmpty);
    }

    fn on_beacon_status_change(&mut self, state: BeaconState) {
        if self.debug {
            log::info!("BEACON {:?}", state);
        }
    }

    fn on_sys_time_update(&mut self, _synchronized: bool, _correction: i32) {}

    fn on_tx_periodicity_changed(&mut self, periodicity_ms: u32) {
        self.tx_periodicity_ms = periodicity_ms;
    }

    fn on_tx_frame_ctrl_changed(&mut self, msg_type: MsgType) {
        self.tx_msg_type = msg_type;
    }

    fn on_ping_slot_periodicity_changed(&mut self, periodicity: u8) {
        self.ping_slot_periodicity = periodicity;
    }
}
