//! Byte-addressable telemetry sources and the transmit cursor.
//!
//! Telemetry is sent two bytes per transmit interrupt. Whatever is being sent (the housekeeping
//! registers, the science data file, or a window of data memory) is read through the same
//! one-method interface, [`TelemetrySource::byte_at`].
//!
//! Which source a transmission reads from is fixed when the transmission is armed: the
//! [`TmCursor`] carries a [`TmSource`] tag that the transmitter resolves on every interrupt, and
//! only the sequencer (or the register-mode wrap in the transmitter) replaces the cursor.

use crate::consts::MEMORY_BUFFER_SIZE;
use crate::hal::DataMemory;

/// Anything the transmitter can stream.
pub trait TelemetrySource {
    /// Returns the byte at `index`. Indices past the end of the source read as zero.
    fn byte_at(&self, index: usize) -> u8;
}

/// Which telemetry source an armed cursor reads from.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TmSource {
    /// The housekeeping register block.
    #[default]
    Register,
    /// The science data file.
    Science,
    /// A window of data memory starting at `base`.
    Memory {
        /// First address of the window.
        base: u16,
    },
}

/// Position of the transmitter inside the active telemetry source.
///
/// `index` always advances by two; transmission is complete once `index >= end`.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TmCursor {
    /// Source being transmitted.
    pub source: TmSource,
    /// Index of the next byte to send.
    pub index: usize,
    /// One past the last byte to send.
    pub end: usize,
}

impl TmCursor {
    /// Creates a cursor over `source` covering `index..end`.
    pub const fn new(source: TmSource, index: usize, end: usize) -> Self {
        Self { source, index, end }
    }

    /// A cursor that has nothing left to send.
    pub const fn idle() -> Self {
        Self::new(TmSource::Register, 0, 0)
    }

    /// Whether every byte of the armed range has been sent.
    pub fn exhausted(&self) -> bool {
        self.index >= self.end
    }
}

/// A [`MEMORY_BUFFER_SIZE`]-byte window of data memory, used for memory dumps.
#[derive(Debug)]
pub struct MemoryWindow<'a, M: DataMemory + ?Sized> {
    memory: &'a M,
    base: u16,
}

impl<'a, M: DataMemory + ?Sized> MemoryWindow<'a, M> {
    /// Creates a window starting at `base`.
    pub fn new(memory: &'a M, base: u16) -> Self {
        Self { memory, base }
    }
}

impl<M: DataMemory + ?Sized> TelemetrySource for MemoryWindow<'_, M> {
    fn byte_at(&self, index: usize) -> u8 {
        if index >= MEMORY_BUFFER_SIZE {
            return 0;
        }
        self.memory
            .read_data_memory(self.base.wrapping_add(index as u16))
    }
}
