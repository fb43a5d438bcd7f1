/// LoRaWAN regional parameter set
///
/// Only an identifier: channel plans and regional limits belong to the MAC
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Region {
    /// Asia 923 MHz
    AS923,
    /// Australia 915 MHz
    AU915,
    /// China 470 MHz
    CN470,
    /// China 779 MHz
    CN779,
    /// Europe 433 MHz
    EU433,
    /// Europe 868 MHz
    EU868,
    /// Korea 920 MHz
    KR920,
    /// India 865 MHz
    IN865,
    /// North America 915 MHz
    US915,
    /// Russia 864 MHz
    RU864,
}

/// Data rate index (DR0..DR15), interpreted by the region
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataRate(pub u8);

impl DataRate {
    /// Lowest data rate, longest range
    pub const DR0: DataRate = DataRate(0);
}
