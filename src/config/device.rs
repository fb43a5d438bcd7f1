use super::hex::{self, HexError};
use crate::lorawan::handler::{
    CommissioningParams, ABP_ACTIVATION_LRWAN_VERSION, LORAWAN_NETWORK_ID,
};

/// EUI-64 (8 bytes)
pub type EUI64 = [u8; 8];
/// AES-128 key (16 bytes)
pub type AESKey = [u8; 16];
/// Device Address (32 bits)
pub type DevAddr = u32;

/// Highest device address picked when ABP settings carry none
const RANDOM_DEV_ADDR_MAX: u32 = 0x01FF_FFFF;

/// LoRaWAN device class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceClass {
    /// Class A: Uplink followed by two receive windows
    A,
    /// Class B: Scheduled receive slots (beaconing)
    B,
    /// Class C: Continuously listening except when transmitting
    C,
}

/// Channel mask: six 16-bit words, each encoded as four hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMask(pub [u16; 6]);

impl ChannelMask {
    /// Decode 24 hex digits, most significant byte of each word first
    pub fn from_hex(text: &str) -> Result<Self, HexError> {
        let bytes = hex::decode::<12>(text)?;
        let mut words = [0u16; 6];
        for (word, pair) in words.iter_mut().zip(bytes.chunks_exact(2)) {
            *word = u16::from_be_bytes([pair[0], pair[1]]);
        }
        Ok(Self(words))
    }
}

/// Over-the-air activation credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtaaSettings {
    /// Device EUI
    pub dev_eui: EUI64,
    /// Application (join) EUI
    pub app_eui: EUI64,
    /// Application key
    pub app_key: AESKey,
    /// Channel mask, region default when `None`
    pub channel_mask: Option<ChannelMask>,
}

impl OtaaSettings {
    /// Decode OTAA credentials from hexadecimal text
    pub fn from_hex(
        dev_eui: &str,
        app_eui: &str,
        app_key: &str,
        channel_mask: Option<&str>,
    ) -> Result<Self, HexError> {
        Ok(Self {
            dev_eui: hex::decode(dev_eui)?,
            app_eui: hex::decode(app_eui)?,
            app_key: hex::decode(app_key)?,
            channel_mask: channel_mask.map(ChannelMask::from_hex).transpose()?,
        })
    }
}

/// Activation-by-personalization credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbpSettings {
    /// Device address, random when `None`
    pub dev_addr: Option<DevAddr>,
    /// Network session key
    pub nwk_s_key: AESKey,
    /// Application session key
    pub app_s_key: AESKey,
    /// Channel mask, region default when `None`
    pub channel_mask: Option<ChannelMask>,
}

impl AbpSettings {
    /// Decode ABP credentials from hexadecimal text
    pub fn from_hex(
        dev_addr: Option<&str>,
        nwk_s_key: &str,
        app_s_key: &str,
        channel_mask: Option<&str>,
    ) -> Result<Self, HexError> {
        Ok(Self {
            dev_addr: dev_addr.map(hex::decode_u32).transpose()?,
            nwk_s_key: hex::decode(nwk_s_key)?,
            app_s_key: hex::decode(app_s_key)?,
            channel_mask: channel_mask.map(ChannelMask::from_hex).transpose()?,
        })
    }
}

/// Activation method of a session; exactly one is active
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationSettings {
    /// Over-the-air activation
    Otaa(OtaaSettings),
    /// Activation by personalization
    Abp(AbpSettings),
}

impl ActivationSettings {
    /// Whether over-the-air activation is selected
    pub fn is_otaa(&self) -> bool {
        matches!(self, ActivationSettings::Otaa(_))
    }

    /// Configured channel mask, if any
    pub fn channel_mask(&self) -> Option<ChannelMask> {
        match self {
            ActivationSettings::Otaa(otaa) => otaa.channel_mask,
            ActivationSettings::Abp(abp) => abp.channel_mask,
        }
    }

    /// Fill in the network parameters requested by the MAC engine
    ///
    /// `random_seed` picks the device address when ABP settings carry none.
    pub fn commission(&self, params: &mut CommissioningParams, random_seed: u32) {
        match self {
            ActivationSettings::Otaa(otaa) => {
                params.is_otaa = true;
                params.dev_eui = Some(otaa.dev_eui);
                params.join_eui = Some(otaa.app_eui);
                params.app_key = Some(otaa.app_key);
                params.nwk_key = Some(otaa.app_key);
            }
            ActivationSettings::Abp(abp) => {
                params.is_otaa = false;
                params.abp_lrwan_version = Some(ABP_ACTIVATION_LRWAN_VERSION);
                params.net_id = Some(LORAWAN_NETWORK_ID);
                params.dev_addr = Some(
                    abp.dev_addr
                        .unwrap_or_else(|| random_dev_addr(random_seed)),
                );
                params.app_s_key = Some(abp.app_s_key);
                params.f_nwk_s_int_key = Some(abp.nwk_s_key);
                params.s_nwk_s_int_key = Some(abp.nwk_s_key);
                params.nwk_s_enc_key = Some(abp.nwk_s_key);
            }
        }

        if let Some(mask) = self.channel_mask() {
            params.channel_mask = Some(mask);
            params.channel_default_mask = Some(mask);
        }
    }
}

impl From<OtaaSettings> for ActivationSettings {
    fn from(settings: OtaaSettings) -> Self {
        ActivationSettings::Otaa(settings)
    }
}

impl From<AbpSettings> for ActivationSettings {
    fn from(settings: AbpSettings) -> Self {
        ActivationSettings::Abp(settings)
    }
}

/// Seeded pseudo-random device address in `0..=RANDOM_DEV_ADDR_MAX`
fn random_dev_addr(seed: u32) -> DevAddr {
    // LCG of the MAC engine's utilities (srand1/randr).
    const RAND_LOCAL_MAX: u32 = 2_147_483_647;
    let next = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
    (next % RAND_LOCAL_MAX) % (RANDOM_DEV_ADDR_MAX + 1)
}
