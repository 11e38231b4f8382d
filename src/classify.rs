//! Command classification table.
//!
//! Every 7-bit command address maps to one of five validity rules. The rule decides which codes
//! are acceptable for that address; addresses not used by the instrument are [`TcClass::Invalid`].
//!
//! The table is built at compile time and never changes afterwards, so the decoder interrupt
//! can consult it without any synchronisation.
//!
//! ## Functions
//!
//! - [`class_of`]: Looks up the rule of an address
//! - [`TcClass::accepts`]: Applies a rule to an address/code pair

use crate::consts::*;

/// Validity rule of a command address.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TcClass {
    /// The address is not a command.
    Invalid,
    /// Any code is accepted.
    AnyCodeValid,
    /// The code must repeat the address.
    CodeMustEqualAddress,
    /// The code must be [`ON_VALUE`], [`OFF_VALUE`] or [`SELF_TEST`].
    OnOffOrSelfTestCode,
    /// The code must be even and not above [`LAST_EVEN_REGISTER`].
    EvenCodeUpToLimit,
}

impl TcClass {
    /// Returns `true` when `code` satisfies this rule for `address`.
    pub fn accepts(self, address: u8, code: u8) -> bool {
        match self {
            TcClass::Invalid => false,
            TcClass::AnyCodeValid => true,
            TcClass::CodeMustEqualAddress => code == address,
            TcClass::OnOffOrSelfTestCode => matches!(code, ON_VALUE | OFF_VALUE | SELF_TEST),
            TcClass::EvenCodeUpToLimit => code % 2 == 0 && code <= LAST_EVEN_REGISTER,
        }
    }
}

const SU_BASES: [u8; NUM_SU] = [SWITCH_SU_1, SWITCH_SU_2, SWITCH_SU_3, SWITCH_SU_4];

const fn build_table() -> [TcClass; 128] {
    let mut table = [TcClass::Invalid; 128];

    table[START_ACQUISITION as usize] = TcClass::CodeMustEqualAddress;
    table[STOP_ACQUISITION as usize] = TcClass::CodeMustEqualAddress;
    table[ERROR_STATUS_CLEAR as usize] = TcClass::CodeMustEqualAddress;
    table[SEND_SCIENCE_DATA_FILE as usize] = TcClass::CodeMustEqualAddress;
    table[SOFT_RESET as usize] = TcClass::CodeMustEqualAddress;
    table[CLEAR_WATCHDOG_FAILURES as usize] = TcClass::CodeMustEqualAddress;
    table[CLEAR_CHECKSUM_FAILURES as usize] = TcClass::CodeMustEqualAddress;

    table[SEND_STATUS_REGISTER as usize] = TcClass::EvenCodeUpToLimit;

    table[SET_TIME_BYTE_0 as usize] = TcClass::AnyCodeValid;
    table[SET_TIME_BYTE_1 as usize] = TcClass::AnyCodeValid;
    table[SET_TIME_BYTE_2 as usize] = TcClass::AnyCodeValid;
    table[SET_TIME_BYTE_3 as usize] = TcClass::AnyCodeValid;

    table[WRITE_CODE_MEMORY_MSB as usize] = TcClass::AnyCodeValid;
    table[WRITE_CODE_MEMORY_LSB as usize] = TcClass::AnyCodeValid;
    table[WRITE_DATA_MEMORY_MSB as usize] = TcClass::AnyCodeValid;
    table[WRITE_DATA_MEMORY_LSB as usize] = TcClass::AnyCodeValid;
    table[READ_DATA_MEMORY_MSB as usize] = TcClass::AnyCodeValid;
    table[READ_DATA_MEMORY_LSB as usize] = TcClass::AnyCodeValid;

    let mut su = 0;
    while su < NUM_SU {
        let base = SU_BASES[su] as usize;
        table[base] = TcClass::OnOffOrSelfTestCode;
        // thresholds and classification levels follow the switch command
        let mut offset = PLASMA_1_PLUS_THRESHOLD_OFFSET as usize;
        while offset < CLASS_LEVEL_OFFSET as usize + NUM_CLASS_LEVELS {
            table[base + offset] = TcClass::AnyCodeValid;
            offset += 1;
        }
        su += 1;
    }

    let mut address = SET_COEFFICIENT_1 as usize;
    while address <= SET_COEFFICIENT_5 as usize {
        table[address] = TcClass::AnyCodeValid;
        address += 1;
    }

    table
}

static TC_CLASSES: [TcClass; 128] = build_table();

/// Looks up the validity rule of a command address.
///
/// Only the low 7 bits of `address` are used.
pub fn class_of(address: u8) -> TcClass {
    TC_CLASSES[(address & MAX_TC_ADDRESS) as usize]
}
