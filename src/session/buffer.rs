use crate::lorawan::mac::{AppData, MacEngine, MacStatus, MsgType, MAX_APP_PAYLOAD};

/// Uplink submission error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// Payload exceeds the application buffer
    PayloadTooLarge,
    /// The MAC engine refused the uplink
    Rejected(MacStatus),
}

impl From<MacStatus> for SendError {
    fn from(status: MacStatus) -> Self {
        SendError::Rejected(status)
    }
}

/// Single-slot application mailboxes
///
/// One outgoing and one incoming message. A new downlink overwrites an
/// unread one; the application is expected to poll often enough.
#[derive(Debug, Default)]
pub struct UplinkDownlinkBuffer {
    uplink: AppData,
    downlink: AppData,
}

impl UplinkDownlinkBuffer {
    /// Empty mailboxes
    pub const fn new() -> Self {
        Self {
            uplink: AppData::empty(),
            downlink: AppData::empty(),
        }
    }

    /// Copy `payload` into the uplink slot and hand it to the engine
    ///
    /// Sent unconfirmed. A refusal is returned as is and not retried.
    pub fn submit_uplink<M: MacEngine>(
        &mut self,
        mac: &mut M,
        payload: &[u8],
        port: u8,
    ) -> Result<(), SendError> {
        self.uplink.payload.clear();
        self.uplink
            .payload
            .extend_from_slice(payload)
            .map_err(|_| SendError::PayloadTooLarge)?;
        self.uplink.port = port;

        mac.send(&self.uplink, MsgType::Unconfirmed).map_err(|status| {
            log::warn!("uplink on port {} rejected: {:?}", port, status);
            SendError::from(status)
        })
    }

    /// Last submitted uplink
    pub fn uplink(&self) -> &AppData {
        &self.uplink
    }

    /// Store a received downlink, replacing any unread one
    ///
    /// Payloads beyond the slot capacity are truncated.
    pub fn on_downlink_received(&mut self, payload: &[u8], port: u8) {
        let len = payload.len().min(MAX_APP_PAYLOAD);
        self.downlink.payload.clear();
        // Cannot fail: `len` is within capacity.
        let _ = self.downlink.payload.extend_from_slice(&payload[..len]);
        self.downlink.port = port;
    }

    /// Whether an unread downlink is waiting
    pub fn has_downlink(&self) -> bool {
        !self.downlink.is_empty()
    }

    /// Move the pending downlink into `buf`
    ///
    /// Returns the number of bytes copied and the port, or `None` when no
    /// downlink is waiting. Bytes that do not fit `buf` are dropped. The slot
    /// is empty afterwards either way.
    pub fn take_downlink(&mut self, buf: &mut [u8]) -> Option<(usize, u8)> {
        if !self.has_downlink() {
            return None;
        }
        let len = self.downlink.payload.len().min(buf.len());
        buf[..len].copy_from_slice(&self.downlink.payload[..len]);
        let port = self.downlink.port;

        self.downlink.port = 0;
        self.downlink.payload.clear();
        Some((len, port))
    }
}
