//! Command decoder, run from the command-arrival interrupt.
//!
//! Each interrupt delivers one 16-bit word. Depending on the sequencer state the word is
//! ignored (bulk downlink in progress), forwarded untouched as memory patch payload, or decoded
//! as a command: parity, then the address classification, then the address's code rule. Valid
//! commands are posted to the mailbox; invalid ones set a sticky error bit and the status
//! registers are echoed straight away on the telemetry lines.

use embedded_hal::digital::OutputPin;

use crate::command::CommandWord;
use crate::consts::{SEND_STATUS_REGISTER, TC_ERROR};
use crate::hal::TcTmHardware;
use crate::mailbox::Mail;
use crate::sequencer::{TcState, TcTmEngine};

impl<H, P> TcTmEngine<H, P>
where
    H: TcTmHardware,
    P: OutputPin,
{
    /// Handles one command interrupt.
    ///
    /// # Behavior
    /// - Restarts the command spacing timer. A word arriving too early sets `TC_ERROR` and is
    ///   not decoded at all.
    /// - Ignored while science telemetry or a memory dump is being sent.
    /// - Posted as [`Mail::PatchWord`] while a memory patch is collecting payload.
    /// - Stops register telemetry, then decodes the word.
    /// - The word and the current time are latched into housekeeping, except for a valid
    ///   `SEND_STATUS_REGISTER` (so the requested block still shows the previous command).
    pub fn tc_interrupt(&mut self) {
        let spaced = self.hw.command_spacing_elapsed();
        self.hw.restart_command_timer();
        if !spaced {
            self.hk.set_error(TC_ERROR);
            warn!("command spacing violated");
            return;
        }

        match self.state() {
            TcState::ScienceTelemetry | TcState::MemoryDump => {
                trace!("command ignored during downlink");
                return;
            }
            TcState::MemoryPatch => {
                let raw = self.hw.read_command_word();
                self.post(Mail::PatchWord(raw));
                return;
            }
            TcState::RegisterTelemetry => {
                self.hw.set_tm_interrupt(false);
                self.set_state(TcState::Handling);
            }
            _ => {}
        }

        let word = CommandWord::from_raw(self.hw.read_command_word());
        let result = word.validate();
        match result {
            Ok(()) => self.post(Mail::Command(word)),
            Err(e) => {
                warn!("command word {} rejected: {}", word.raw(), e);
                self.hk.set_error(e.error_bit());
                self.hw
                    .write_telemetry(self.hk.error_status, self.hk.mode_status);
            }
        }

        if result.is_err() || word.address() != SEND_STATUS_REGISTER {
            self.hk.tc_word = word.raw();
            self.hk.tc_time_tag = self.time();
        }
    }
}
