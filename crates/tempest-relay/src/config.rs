//! Radio configuration descriptors for the three relay phases.
//!
//! The core only knows these values; applying them is the radio
//! collaborator's job. Three named parameter sets exist: the TEMPEST
//! listening configuration, the LoRaWAN transmit configuration (frequency
//! varies with the channel index), and the Meshtastic transmit
//! configuration.

/// LoRa sync word for private networks (TEMPEST listens here).
pub const SYNC_WORD_PRIVATE: u8 = 0x12;

/// Public LoRaWAN sync word.
pub const SYNC_WORD_LORAWAN: u8 = 0x34;

/// Meshtastic sync word.
pub const SYNC_WORD_MESHTASTIC: u8 = 0x2B;

/// Number of LoRaWAN uplink channels in the hop ring.
pub const LORAWAN_CHANNEL_COUNT: u8 = 8;

/// US915 sub-band 2 uplink center frequencies (channels 8-15), MHz.
pub const LORAWAN_CHANNELS_MHZ: [f32; LORAWAN_CHANNEL_COUNT as usize] =
    [903.9, 904.1, 904.3, 904.5, 904.7, 904.9, 905.1, 905.3];

/// Hardware CRC handling for a LoRa frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcMode {
    /// No LoRa-level CRC (Meshtastic disables it).
    Disabled,
    /// Two-byte hardware CRC.
    TwoByte,
}

/// One immutable radio parameter set.
///
/// Selecting a configuration is a side-effecting call on the radio
/// collaborator; the core treats these as plain values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadioConfig {
    /// Center frequency in MHz.
    pub frequency_mhz: f32,
    /// Bandwidth in kHz.
    pub bandwidth_khz: f32,
    /// LoRa spreading factor.
    pub spreading_factor: u8,
    /// Coding rate denominator (5 = 4/5).
    pub coding_rate: u8,
    /// Preamble length in symbols.
    pub preamble_symbols: u16,
    /// LoRa sync word.
    pub sync_word: u8,
    /// Hardware CRC mode.
    pub crc_mode: CrcMode,
    /// Transmit power in dBm.
    pub tx_power_dbm: i8,
}

/// TEMPEST listening parameters: 915 MHz, BW 500, SF 7, private sync.
pub const TEMPEST_RX: RadioConfig = RadioConfig {
    frequency_mhz: 915.0,
    bandwidth_khz: 500.0,
    spreading_factor: 7,
    coding_rate: 5,
    preamble_symbols: 8,
    sync_word: SYNC_WORD_PRIVATE,
    crc_mode: CrcMode::TwoByte,
    tx_power_dbm: 22,
};

/// Meshtastic transmit parameters: 906.875 MHz, BW 250, SF 11, no CRC.
pub const MESHTASTIC_TX: RadioConfig = RadioConfig {
    frequency_mhz: 906.875,
    bandwidth_khz: 250.0,
    spreading_factor: 11,
    coding_rate: 5,
    preamble_symbols: 16,
    sync_word: SYNC_WORD_MESHTASTIC,
    crc_mode: CrcMode::Disabled,
    tx_power_dbm: 22,
};

/// LoRaWAN transmit parameters for one channel of the hop ring.
///
/// `channel_index` is reduced modulo the ring size, so any index is
/// valid.
pub fn lorawan_tx(channel_index: u8) -> RadioConfig {
    let slot = (channel_index % LORAWAN_CHANNEL_COUNT) as usize;
    RadioConfig {
        frequency_mhz: LORAWAN_CHANNELS_MHZ[slot],
        bandwidth_khz: 125.0,
        spreading_factor: 7,
        coding_rate: 5,
        preamble_symbols: 8,
        sync_word: SYNC_WORD_LORAWAN,
        crc_mode: CrcMode::TwoByte,
        tx_power_dbm: 22,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_frequencies_ascend_in_200khz_steps() {
        for pair in LORAWAN_CHANNELS_MHZ.windows(2) {
            assert!((pair[1] - pair[0] - 0.2).abs() < 1e-4);
        }
    }

    #[test]
    fn lorawan_tx_wraps_channel_index() {
        assert_eq!(lorawan_tx(0), lorawan_tx(8));
        assert_eq!(lorawan_tx(3).frequency_mhz, LORAWAN_CHANNELS_MHZ[3]);
    }

    #[test]
    fn phases_use_distinct_sync_words() {
        assert_ne!(TEMPEST_RX.sync_word, MESHTASTIC_TX.sync_word);
        assert_ne!(TEMPEST_RX.sync_word, lorawan_tx(0).sync_word);
        assert_ne!(MESHTASTIC_TX.sync_word, lorawan_tx(0).sync_word);
    }

    #[test]
    fn meshtastic_disables_hardware_crc() {
        assert_eq!(MESHTASTIC_TX.crc_mode, CrcMode::Disabled);
        assert_eq!(TEMPEST_RX.crc_mode, CrcMode::TwoByte);
    }
}
