//! Telemetry transmitter, run from the transmit-ready interrupt.
//!
//! Every interrupt sends the next two bytes of the armed [`TmCursor`](crate::telemetry::TmCursor)
//! source. What happens once the cursor is exhausted depends on the sequencer state:
//!
//! | State               | On exhaustion                                                |
//! |---------------------|--------------------------------------------------------------|
//! | `RegisterTelemetry` | wrap to register 0 and keep sending                          |
//! | `MemoryDump`        | send `(0x00, checksum)`, disable the interrupt, `TmReady`    |
//! | anything else       | disable the interrupt, `TmReady`                             |

use embedded_hal::digital::OutputPin;

use crate::consts::{HK_BLOCK_SIZE, TIME_INDEX};
use crate::hal::TcTmHardware;
use crate::mailbox::Mail;
use crate::sequencer::{TcState, TcTmEngine};
use crate::telemetry::{MemoryWindow, TelemetrySource, TmCursor, TmSource};

fn word_at<S: TelemetrySource + ?Sized>(source: &S, index: usize) -> (u8, u8) {
    (source.byte_at(index), source.byte_at(index + 1))
}

impl<H, P> TcTmEngine<H, P>
where
    H: TcTmHardware,
    P: OutputPin,
{
    /// Handles one transmit interrupt.
    ///
    /// The housekeeping time field is refreshed from the instrument time right before it is
    /// sent.
    pub fn tm_interrupt(&mut self) {
        if self.cursor.exhausted() && self.state() == TcState::RegisterTelemetry {
            self.cursor = TmCursor::new(TmSource::Register, 0, HK_BLOCK_SIZE);
        }

        let index = self.cursor.index;
        if self.cursor.source == TmSource::Register && index == TIME_INDEX {
            self.hk.time = self.time();
        }

        if !self.cursor.exhausted() {
            let (msb, lsb) = match self.cursor.source {
                TmSource::Register => word_at(&self.hk, index),
                TmSource::Science => word_at(&self.science, index),
                TmSource::Memory { base } => word_at(&MemoryWindow::new(&self.hw, base), index),
            };
            self.hw.write_telemetry(msb, lsb);
            self.cursor.index += 2;
            if self.state() == TcState::MemoryDump {
                self.dump_checksum ^= msb ^ lsb;
            }
            trace!("tm {} {} at {}", msb, lsb, index);
            return;
        }

        if self.state() == TcState::MemoryDump {
            self.hw.write_telemetry(0x00, self.dump_checksum);
        }
        self.hw.set_tm_interrupt(false);
        self.post(Mail::TmReady);
    }
}
