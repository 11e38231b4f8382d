//! Command words as they arrive from the command registers.
//!
//! A command word is 16 bits:
//!
//! ```text
//!  15          9   8   7               0
//! +-------------+---+-----------------+
//! |   address   | p |      code       |
//! +-------------+---+-----------------+
//! ```
//!
//! The parity bit `p` is chosen so that the XOR of all 16 bits is zero.

use crate::classify::{TcClass, class_of};
use crate::error::TcError;
use crate::parity::{even_parity, hi8, lo8, parity_bit};

/// One received command word.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct CommandWord(u16);

impl CommandWord {
    /// Wraps a raw word read from the command registers.
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Builds a word with a correct parity bit.
    pub fn new(address: u8, code: u8) -> Self {
        let address = address & 0x7f;
        let msb = (address << 1) | parity_bit(address, code);
        Self(((msb as u16) << 8) | code as u16)
    }

    /// The raw 16-bit word.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// The 7-bit command address.
    pub fn address(self) -> u8 {
        hi8(self.0) >> 1
    }

    /// The 8-bit command code.
    pub fn code(self) -> u8 {
        lo8(self.0)
    }

    /// Whether the word passes the even parity check.
    pub fn parity_ok(self) -> bool {
        even_parity(self.0)
    }

    /// Checks parity and the address/code rule of the classification table.
    ///
    /// # Returns
    /// - `Ok(())` if the word may be posted to the sequencer
    /// - `Err(TcError::Parity)` on a parity failure
    /// - `Err(TcError::InvalidAddress)` for addresses the instrument does not use
    /// - `Err(TcError::InvalidCode)` when the code breaks the address rule
    pub fn validate(self) -> Result<(), TcError> {
        if !self.parity_ok() {
            return Err(TcError::Parity);
        }
        let address = self.address();
        let code = self.code();
        let class = class_of(address);
        if class == TcClass::Invalid {
            return Err(TcError::InvalidAddress(address));
        }
        if !class.accepts(address, code) {
            return Err(TcError::InvalidCode { address, code });
        }
        Ok(())
    }
}

impl From<u16> for CommandWord {
    fn from(raw: u16) -> Self {
        Self::from_raw(raw)
    }
}
