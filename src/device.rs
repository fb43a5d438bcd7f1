//! High-level LoRaWAN device interface
//!
//! This module provides the application-facing surface: bring-up of the
//! radio and the MAC engine, activation, and the send / receive / process
//! calls an application loop is built from.

use core::time::Duration;

use heapless::String;

use crate::{
    board::Platform,
    config::{
        device::{AbpSettings, ActivationSettings, OtaaSettings},
        hex,
    },
    lorawan::{
        mac::{ComplianceParams, MacEngine, SYSTEM_MAX_RX_ERROR_MS},
        region::Region,
    },
    nvm::{NvmError, NvmStorage},
    radio::traits::{RadioBoard, SX127X_VERSION},
    session::{Outcome, SendError, SessionContext, SessionEventLoop, WorkState},
    sync::PendingWorkFlag,
};

/// Device initialization error
#[derive(Debug)]
pub enum InitError<RE, ME> {
    /// Radio bus or pin error
    Radio(RE),
    /// Version register did not identify an SX127x
    HardwareAbsent {
        /// Value read from the version register
        version: u8,
    },
    /// MAC engine initialization failed
    Mac(ME),
}

/// NVM erase error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseError {
    /// The engine could not reset its stored context
    FactoryReset,
    /// Writing the reset context to flash failed
    Flash(NvmError),
}

impl From<NvmError> for EraseError {
    fn from(error: NvmError) -> Self {
        EraseError::Flash(error)
    }
}

/// LoRaWAN device implementation
pub struct LoRaWANDevice<'a, M, S, R, P> {
    mac: M,
    radio: R,
    platform: P,
    session: SessionContext<S>,
    event_loop: SessionEventLoop<'a>,
}

impl<'a, M, S, R, P> LoRaWANDevice<'a, M, S, R, P>
where
    M: MacEngine,
    S: NvmStorage,
    R: RadioBoard,
    P: Platform,
{
    /// Create new LoRaWAN device
    ///
    /// `pending` is the flag the engine notifies when it needs another
    /// processing pass.
    pub fn new(mac: M, radio: R, nvm: S, platform: P, pending: &'a PendingWorkFlag) -> Self {
        let session = SessionContext::new(nvm, platform.random_seed());
        Self {
            mac,
            radio,
            platform,
            session,
            event_loop: SessionEventLoop::new(pending),
        }
    }

    /// Bring up the radio and the MAC engine for `region`
    ///
    /// Uses whatever activation settings were selected before; see
    /// [`init_otaa`](Self::init_otaa) and [`init_abp`](Self::init_abp).
    pub fn init(&mut self, region: Region) -> Result<(), InitError<R::Error, M::Error>> {
        self.radio.io_init().map_err(InitError::Radio)?;
        self.radio.reset().map_err(InitError::Radio)?;

        let version = self.radio.version().map_err(InitError::Radio)?;
        if version != SX127X_VERSION {
            log::warn!("radio version register reads {:#04x}", version);
            return Err(InitError::HardwareAbsent { version });
        }

        let params = self.session.mac_params(region);
        self.mac
            .init(&params, &mut self.session)
            .map_err(InitError::Mac)?;
        self.mac.set_system_max_rx_error(SYSTEM_MAX_RX_ERROR_MS);
        self.mac
            .register_compliance(&ComplianceParams::default())
            .map_err(InitError::Mac)?;
        Ok(())
    }

    /// Initialize for over-the-air activation
    pub fn init_otaa(
        &mut self,
        region: Region,
        settings: OtaaSettings,
    ) -> Result<(), InitError<R::Error, M::Error>> {
        self.init_with_activation(region, settings.into())
    }

    /// Initialize for activation by personalization
    pub fn init_abp(
        &mut self,
        region: Region,
        settings: AbpSettings,
    ) -> Result<(), InitError<R::Error, M::Error>> {
        self.init_with_activation(region, settings.into())
    }

    /// Select `activation`, replacing any previous one, then initialize
    pub fn init_with_activation(
        &mut self,
        region: Region,
        activation: ActivationSettings,
    ) -> Result<(), InitError<R::Error, M::Error>> {
        self.session.set_activation(Some(activation));
        self.init(region)
    }

    /// Start the join procedure; completion is observed via `is_joined`
    pub fn join(&mut self) {
        self.mac.join();
    }

    /// Whether the device has joined a network
    pub fn is_joined(&self) -> bool {
        self.mac.is_joined()
    }

    /// Run one processing pass without blocking
    pub fn process(&mut self) -> WorkState {
        self.event_loop.process(&mut self.mac, &mut self.session)
    }

    /// Process until a downlink arrives, the join status changes, or
    /// `timeout_ms` elapses
    pub fn process_timeout_ms(&mut self, timeout_ms: u32) -> Outcome {
        self.event_loop.process_with_timeout(
            &mut self.mac,
            &mut self.session,
            &mut self.platform,
            Duration::from_millis(u64::from(timeout_ms)),
        )
    }

    /// Queue an unconfirmed uplink on `port`
    pub fn send_unconfirmed(&mut self, payload: &[u8], port: u8) -> Result<(), SendError> {
        self.session
            .buffers_mut()
            .submit_uplink(&mut self.mac, payload, port)
    }

    /// Take the pending downlink, truncated to `buf`
    ///
    /// Returns `(length, port)`, or `None` when nothing was received.
    pub fn receive(&mut self, buf: &mut [u8]) -> Option<(usize, u8)> {
        self.session.buffers_mut().take_downlink(buf)
    }

    /// Reset the stored session context to factory defaults
    pub fn erase_nvm(&mut self) -> Result<(), EraseError> {
        if !self.mac.factory_reset(&mut self.session) {
            return Err(EraseError::FactoryReset);
        }
        self.session.storage().flush()?;
        Ok(())
    }

    /// Log engine callbacks
    pub fn set_debug(&mut self, debug: bool) {
        self.session.set_debug(debug);
    }

    /// Board unique id as 16 upper-case hex digits
    pub fn default_dev_eui(&self) -> String<16> {
        hex::encode_upper(&self.platform.unique_id())
    }

    /// MAC engine
    pub fn mac(&self) -> &M {
        &self.mac
    }

    /// MAC engine, mutably
    pub fn mac_mut(&mut self) -> &mut M {
        &mut self.mac
    }

    /// Radio board
    pub fn radio(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Board services
    pub fn platform(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Session state
    pub fn session(&self) -> &SessionContext<S> {
        &self.session
    }

    /// Session state, mutably
    pub fn session_mut(&mut self) -> &mut SessionContext<S> {
        &mut self.session
    }
}
