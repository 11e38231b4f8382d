//! Command rejection reasons.
//!
//! Errors never travel further than the decoder or sequencer that detected them: they end up as
//! sticky bits in the housekeeping error status register, which only an explicit
//! `ERROR_STATUS_CLEAR` command resets. [`TcError::error_bit`] gives the bit for each reason.

use thiserror::Error;

use crate::consts::{MEMORY_WRITE_ERROR, PARITY_ERROR, TC_ERROR};

/// Reason a command word or command sequence was rejected.
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TcError {
    /// The command arrived before the minimum command spacing elapsed.
    #[error("command arrived before the minimum command spacing elapsed")]
    Spacing,
    /// The command word failed the parity check.
    #[error("command word parity error")]
    Parity,
    /// The address is not used by the instrument.
    #[error("invalid command address {0}")]
    InvalidAddress(u8),
    /// The code breaks the rule of the address.
    #[error("invalid code {code} for command address {address}")]
    InvalidCode {
        /// Command address.
        address: u8,
        /// Rejected code.
        code: u8,
    },
    /// The command is not allowed in the current mode or state.
    #[error("command {0} not allowed now")]
    NotAllowed(u8),
    /// A multi-word command sequence was broken or timed out.
    #[error("command sequence broken")]
    SequenceBroken,
    /// A memory transfer targets an address outside the permitted range.
    #[error("memory address {0} out of range")]
    AddressOutOfRange(u16),
    /// A code patch carries an execution tag the instrument does not know.
    #[error("unknown patch execution tag {0}")]
    UnknownPatchAction(u8),
    /// The memory patch checksum did not match.
    #[error("memory patch checksum mismatch")]
    MemoryChecksum,
}

impl TcError {
    /// Sticky error status bit recorded for this error.
    pub fn error_bit(self) -> u8 {
        match self {
            TcError::Parity => PARITY_ERROR,
            TcError::MemoryChecksum => MEMORY_WRITE_ERROR,
            _ => TC_ERROR,
        }
    }
}

/// Result type of command handlers.
pub type Result<T> = core::result::Result<T, TcError>;
