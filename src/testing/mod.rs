//! Recording board fake shared by the unit and integration tests.
//!
//! Available with the `std` feature so the scenario tests under `tests/` drive the engine
//! through the same hardware double as the unit tests.

use crate::hal::{DataMemory, PatchAction, ResetKind, TcTmHardware, TriggerChannel};

#[cfg(test)]
mod engine;
#[cfg(test)]
pub(crate) use engine::*;

/// Board fake recording everything the engine asks of the hardware.
#[derive(Debug)]
pub struct FakeHardware {
    /// Word returned by the next `read_command_word`.
    pub command_word: u16,
    /// Answer of `command_spacing_elapsed`.
    pub spacing_ok: bool,
    /// Number of command timer restarts.
    pub timer_restarts: usize,
    /// Every `(msb, lsb)` written to the telemetry registers.
    pub telemetry: Vec<(u8, u8)>,
    /// Whether the transmit interrupt is enabled.
    pub tm_interrupt: bool,
    /// Number of hit trigger resets.
    pub trigger_resets: usize,
    /// Every trigger level programmed, as `(unit, channel, level)`.
    pub trigger_levels: Vec<(usize, TriggerChannel, u8)>,
    /// The full 64 KiB data address space.
    pub memory: Vec<u8>,
    /// Every code patch applied, as `(address, bytes, action)`.
    pub code_patches: Vec<(u16, Vec<u8>, PatchAction)>,
    /// Every reboot requested.
    pub reboots: Vec<ResetKind>,
}

impl Default for FakeHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHardware {
    /// A board with an idle command line and patterned data memory.
    pub fn new() -> Self {
        Self {
            command_word: 0,
            spacing_ok: true,
            timer_restarts: 0,
            telemetry: Vec::new(),
            tm_interrupt: false,
            trigger_resets: 0,
            trigger_levels: Vec::new(),
            memory: (0..=u16::MAX).map(|a| (a as u8) ^ 0x5a).collect(),
            code_patches: Vec::new(),
            reboots: Vec::new(),
        }
    }
}

impl DataMemory for FakeHardware {
    fn read_data_memory(&self, address: u16) -> u8 {
        self.memory[address as usize]
    }
}

impl TcTmHardware for FakeHardware {
    fn read_command_word(&mut self) -> u16 {
        self.command_word
    }

    fn command_spacing_elapsed(&mut self) -> bool {
        self.spacing_ok
    }

    fn restart_command_timer(&mut self) {
        self.timer_restarts += 1;
    }

    fn write_telemetry(&mut self, msb: u8, lsb: u8) {
        self.telemetry.push((msb, lsb));
    }

    fn set_tm_interrupt(&mut self, enabled: bool) {
        self.tm_interrupt = enabled;
    }

    fn reset_hit_trigger(&mut self) {
        self.trigger_resets += 1;
    }

    fn set_trigger_level(&mut self, unit: usize, channel: TriggerChannel, level: u8) {
        self.trigger_levels.push((unit, channel, level));
    }

    fn write_data_memory(&mut self, address: u16, bytes: &[u8]) {
        let start = address as usize;
        self.memory[start..start + bytes.len()].copy_from_slice(bytes);
    }

    fn patch_code_memory(&mut self, address: u16, bytes: &[u8], action: PatchAction) {
        self.code_patches.push((address, bytes.to_vec(), action));
    }

    fn reboot(&mut self, kind: ResetKind) {
        self.reboots.push(kind);
    }
}
