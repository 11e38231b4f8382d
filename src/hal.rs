//! Hardware abstraction used by the engine.
//!
//! The engine never touches registers directly. Everything it needs from the board (command and
//! telemetry registers, the transmit interrupt enable, trigger level DACs, data and code memory,
//! the reset line) goes through [`TcTmHardware`]. Sensor unit power lines are separate
//! `embedded_hal::digital::OutputPin`s handed to the engine at construction.

/// Read access to the instrument data memory.
///
/// Split out from [`TcTmHardware`] so the memory dump telemetry source can borrow it on its own.
pub trait DataMemory {
    /// Reads one byte of data memory.
    fn read_data_memory(&self, address: u16) -> u8;
}

/// Board services the TC/TM engine depends on.
pub trait TcTmHardware: DataMemory {
    /// Reads the raw 16-bit word from the command registers.
    fn read_command_word(&mut self) -> u16;

    /// Whether the minimum spacing since the previous command word has elapsed.
    fn command_spacing_elapsed(&mut self) -> bool;

    /// Restarts the command spacing timer. Called on every command interrupt.
    fn restart_command_timer(&mut self);

    /// Writes one word to the two telemetry output registers.
    fn write_telemetry(&mut self, msb: u8, lsb: u8);

    /// Enables or disables the telemetry transmit interrupt.
    fn set_tm_interrupt(&mut self, enabled: bool);

    /// Re-arms the hit trigger logic (peak detectors and trigger flip-flops).
    fn reset_hit_trigger(&mut self);

    /// Programs one trigger level of one sensor unit.
    fn set_trigger_level(&mut self, unit: usize, channel: TriggerChannel, level: u8);

    /// Writes a block of data memory.
    fn write_data_memory(&mut self, address: u16, bytes: &[u8]);

    /// Copies a block into code memory and performs the requested follow-up action.
    ///
    /// Does not return on target for the reset and jump actions.
    fn patch_code_memory(&mut self, address: u16, bytes: &[u8], action: PatchAction);

    /// Reboots the processor. Does not return on target.
    fn reboot(&mut self, kind: ResetKind);
}

/// Trigger channels of a sensor unit with a programmable threshold.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TriggerChannel {
    /// Plasma 1+ channel.
    Plasma1Plus,
    /// Plasma 1- channel.
    Plasma1Minus,
    /// Piezo channels.
    Piezo,
}

/// Action requested by the execution tag of a code memory patch.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum PatchAction {
    /// Copy only.
    None,
    /// Copy, then soft reset.
    SoftReset,
    /// Copy, then warm reset (data memory is kept).
    WarmReset,
    /// Copy, then call the patched code.
    JumpToPatch,
}

impl PatchAction {
    /// Decodes the execution tag carried in the high byte of the final patch word.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(PatchAction::None),
            0x09 => Some(PatchAction::SoftReset),
            0x37 => Some(PatchAction::WarmReset),
            0x5a => Some(PatchAction::JumpToPatch),
            _ => None,
        }
    }
}

/// Kind of reboot requested from the hardware.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ResetKind {
    /// Full software reset, as if powered on.
    Soft,
    /// Reset keeping data memory contents.
    Warm,
}
