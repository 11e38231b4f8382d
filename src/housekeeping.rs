//! Housekeeping telemetry block.
//!
//! [`TelemetryData`] is both the register image sent by `SEND_STATUS_REGISTER` and the live
//! configuration of the instrument: the configuration commands write straight into it, and the
//! acquisition side reads thresholds, classification levels and quality coefficients from it.
//!
//! The byte layout is fixed (see the `*_INDEX` constants in [`crate::consts`]); multi-byte
//! fields are sent most significant byte first.

use crate::consts::*;
use crate::telemetry::TelemetrySource;

/// Operating mode of the instrument, kept in the low bits of the mode status register.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Mode {
    /// Processor self test. Science telemetry is refused.
    SelfTest,
    /// Sensor units may be powered but hits are not acquired.
    #[default]
    Standby,
    /// Hits are being acquired.
    Acquisition,
}

impl Mode {
    /// Mode bits as stored in the mode status register.
    pub const fn bits(self) -> u8 {
        match self {
            Mode::SelfTest => 0,
            Mode::Standby => 1,
            Mode::Acquisition => 2,
        }
    }

    /// Decodes the mode bits of a mode status register value.
    pub const fn from_status(status: u8) -> Self {
        match status & MODE_BITS_MASK {
            0 => Mode::SelfTest,
            2 => Mode::Acquisition,
            _ => Mode::Standby,
        }
    }
}

/// Trigger thresholds and classification levels of one sensor unit.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct SuSettings {
    /// Plasma 1+ trigger threshold.
    pub plasma_1_plus_threshold: u8,
    /// Plasma 1- trigger threshold.
    pub plasma_1_minus_threshold: u8,
    /// Piezo trigger threshold.
    pub piezo_threshold: u8,
    /// Classification levels: plasma 1+, plasma 1-, piezo 1, piezo 2, plasma 2+.
    pub class_levels: [u8; NUM_CLASS_LEVELS],
}

impl SuSettings {
    fn byte_at(&self, index: usize) -> u8 {
        match index {
            0 => self.plasma_1_plus_threshold,
            1 => self.plasma_1_minus_threshold,
            2 => self.piezo_threshold,
            i => self.class_levels.get(i - 3).copied().unwrap_or(0),
        }
    }
}

/// The housekeeping register image.
#[derive(PartialEq, Eq, Clone, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TelemetryData {
    /// Sticky error bits ([`TC_ERROR`], [`PARITY_ERROR`], [`MEMORY_WRITE_ERROR`]).
    pub error_status: u8,
    /// Mode bits and mode flags.
    pub mode_status: u8,
    /// Last command word latched by the decoder.
    pub tc_word: u16,
    /// Instrument time at which `tc_word` was latched.
    pub tc_time_tag: u32,
    /// Watchdog reset counter.
    pub watchdog_failures: u8,
    /// Code checksum failure counter.
    pub checksum_failures: u8,
    /// Software version.
    pub sw_version: u8,
    /// Mailbox posts lost because the slot was occupied.
    pub isr_send_message_error: u8,
    /// Per-unit status flags, set by health monitoring.
    pub su_status: [u8; NUM_SU],
    /// Per-unit temperatures, two sensors each.
    pub su_temperature: [[u8; 2]; NUM_SU],
    /// DPU +5 V digital supply reading.
    pub dpu_plus_5_digital: u8,
    /// Task message send failures.
    pub os_send_message_error: u8,
    /// Sensor unit +50 V supply reading.
    pub su_plus_50: u8,
    /// Sensor unit -50 V supply reading.
    pub su_minus_50: u8,
    /// Per-unit thresholds and classification levels.
    pub su_settings: [SuSettings; NUM_SU],
    /// Code memory address that failed the boot check.
    pub failed_code_address: u16,
    /// Data memory address that failed the boot check.
    pub failed_data_address: u16,
    /// Per-unit hit counters, saturating.
    pub su_hits: [u16; NUM_SU],
    /// Instrument time, refreshed just before it is transmitted.
    pub time: u32,
    /// Software error flags.
    pub software_error: u8,
    /// Number of times the hit budget was exceeded.
    pub hit_budget_exceedings: u8,
    /// Quality coefficients.
    pub coefficient: [u8; NUM_QCOEFF],
    not_used: u8,
}

impl Default for TelemetryData {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryData {
    /// Boot-time register image: standby mode, no errors, all settings zero.
    pub const fn new() -> Self {
        Self {
            error_status: 0,
            mode_status: Mode::Standby.bits(),
            tc_word: 0,
            tc_time_tag: 0,
            watchdog_failures: 0,
            checksum_failures: 0,
            sw_version: SW_VERSION,
            isr_send_message_error: 0,
            su_status: [0; NUM_SU],
            su_temperature: [[0; 2]; NUM_SU],
            dpu_plus_5_digital: 0,
            os_send_message_error: 0,
            su_plus_50: 0,
            su_minus_50: 0,
            su_settings: [SuSettings {
                plasma_1_plus_threshold: 0,
                plasma_1_minus_threshold: 0,
                piezo_threshold: 0,
                class_levels: [0; NUM_CLASS_LEVELS],
            }; NUM_SU],
            failed_code_address: 0,
            failed_data_address: 0,
            su_hits: [0; NUM_SU],
            time: 0,
            software_error: 0,
            hit_budget_exceedings: 0,
            coefficient: [0; NUM_QCOEFF],
            not_used: 0,
        }
    }

    /// Current instrument mode.
    pub fn mode(&self) -> Mode {
        Mode::from_status(self.mode_status)
    }

    /// Replaces the mode bits, keeping the other mode status flags.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode_status = (self.mode_status & !MODE_BITS_MASK) | mode.bits();
    }

    /// Sets sticky error bits.
    pub fn set_error(&mut self, bits: u8) {
        self.error_status |= bits;
    }

    /// Clears the error status, the software error flags and the sensor unit status flags.
    pub fn clear_errors(&mut self) {
        self.error_status = 0;
        self.software_error = 0;
        self.su_status = [0; NUM_SU];
    }

    /// Serialised register image, as sent by `SEND_STATUS_REGISTER` from register 0.
    pub fn to_bytes(&self) -> [u8; HK_BLOCK_SIZE] {
        let mut out = [0u8; HK_BLOCK_SIZE];
        for (i, b) in out.iter_mut().enumerate() {
            *b = self.byte_at(i);
        }
        out
    }
}

fn be16(value: u16, index: usize) -> u8 {
    value.to_be_bytes()[index & 1]
}

fn be32(value: u32, index: usize) -> u8 {
    value.to_be_bytes()[index & 3]
}

impl TelemetrySource for TelemetryData {
    fn byte_at(&self, index: usize) -> u8 {
        match index {
            ERROR_STATUS_INDEX => self.error_status,
            MODE_STATUS_INDEX => self.mode_status,
            TC_WORD_INDEX..TC_TIME_TAG_INDEX => be16(self.tc_word, index - TC_WORD_INDEX),
            TC_TIME_TAG_INDEX..WATCHDOG_FAILURES_INDEX => {
                be32(self.tc_time_tag, index - TC_TIME_TAG_INDEX)
            }
            WATCHDOG_FAILURES_INDEX => self.watchdog_failures,
            CHECKSUM_FAILURES_INDEX => self.checksum_failures,
            SW_VERSION_INDEX => self.sw_version,
            ISR_SEND_MESSAGE_ERROR_INDEX => self.isr_send_message_error,
            SU_STATUS_INDEX..SU_TEMPERATURE_INDEX => self.su_status[index - SU_STATUS_INDEX],
            SU_TEMPERATURE_INDEX..DPU_PLUS_5_DIGITAL_INDEX => {
                let i = index - SU_TEMPERATURE_INDEX;
                self.su_temperature[i / 2][i % 2]
            }
            DPU_PLUS_5_DIGITAL_INDEX => self.dpu_plus_5_digital,
            OS_SEND_MESSAGE_ERROR_INDEX => self.os_send_message_error,
            SU_PLUS_50_INDEX => self.su_plus_50,
            SU_MINUS_50_INDEX => self.su_minus_50,
            SU_SETTINGS_INDEX..FAILED_CODE_ADDRESS_INDEX => {
                let i = index - SU_SETTINGS_INDEX;
                self.su_settings[i / SU_SETTINGS_LEN].byte_at(i % SU_SETTINGS_LEN)
            }
            FAILED_CODE_ADDRESS_INDEX..FAILED_DATA_ADDRESS_INDEX => {
                be16(self.failed_code_address, index - FAILED_CODE_ADDRESS_INDEX)
            }
            FAILED_DATA_ADDRESS_INDEX..SU_HITS_INDEX => {
                be16(self.failed_data_address, index - FAILED_DATA_ADDRESS_INDEX)
            }
            SU_HITS_INDEX..TIME_INDEX => {
                let i = index - SU_HITS_INDEX;
                be16(self.su_hits[i / 2], i % 2)
            }
            TIME_INDEX..SOFTWARE_ERROR_INDEX => be32(self.time, index - TIME_INDEX),
            SOFTWARE_ERROR_INDEX => self.software_error,
            HIT_BUDGET_EXCEEDINGS_INDEX => self.hit_budget_exceedings,
            COEFFICIENT_INDEX..HK_NOT_USED_INDEX => self.coefficient[index - COEFFICIENT_INDEX],
            HK_NOT_USED_INDEX => self.not_used,
            _ => 0,
        }
    }
}
