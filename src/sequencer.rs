//! Command execution sequencer and the shared engine state.
//!
//! [`TcTmEngine`] holds everything the two interrupt handlers and the command task share: the
//! sequencer state, the housekeeping register image, the science store, the mailbox and the
//! telemetry cursor. Its methods are split by execution context:
//!
//! - [`TcTmEngine::tc_interrupt`] (command decoder, `decoder.rs`)
//! - [`TcTmEngine::tm_interrupt`] (telemetry transmitter, `transmitter.rs`)
//! - [`TcTmEngine::execute`] (command task, this module)
//!
//! The task loop is: wait on the mailbox for at most [`TcTmEngine::wait_timeout`], then call
//! `execute` with the message, or with `None` if the wait timed out. See
//! [`isr::run_tc_task_loop`](crate::isr::run_tc_task_loop) for the interrupt-driven version.
//!
//! ## States
//!
//! ```text
//!             SEND_STATUS_REGISTER                    SEND_SCIENCE_DATA_FILE
//! RegisterTelemetry <------------- Handling --------------------> ScienceTelemetry
//!        |  (new command word)     ^  |  |                          |  (TmReady: flush)
//!        +-------------------------+  |  +--------------------------+
//!                                     |
//!        READ_DATA_MEMORY_MSB/LSB     |     WRITE_*_MEMORY_MSB/LSB, payload
//!   ReadMemory --> MemoryDump --------+-------- WriteMemory --> MemoryPatch
//! ```

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;

use crate::command::CommandWord;
use crate::consts::*;
use crate::error::{Result, TcError};
use crate::hal::{PatchAction, ResetKind, TcTmHardware, TriggerChannel};
use crate::housekeeping::{Mode, TelemetryData};
use crate::mailbox::{Mail, Mailbox};
use crate::parity::{hi8, lo8};
use crate::science::{EventRecord, Recorded, ScienceStore, Slot};
use crate::telemetry::{TmCursor, TmSource};

/// State of the command execution sequencer.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TcState {
    /// Idle; commands are dispatched by address.
    #[default]
    Handling,
    /// Waiting for the LSB of a memory dump address.
    ReadMemory,
    /// A data memory window is being sent.
    MemoryDump,
    /// Waiting for the LSB of a memory write address.
    WriteMemory,
    /// Collecting memory patch payload words.
    MemoryPatch,
    /// Housekeeping registers are being sent (wrapping until the next command).
    RegisterTelemetry,
    /// The science data file is being sent.
    ScienceTelemetry,
}

/// Power and operating state of one sensor unit.
///
/// The transitions out of [`StartSwitching`](SuState::StartSwitching),
/// [`Switching`](SuState::Switching) and [`SelfTest`](SuState::SelfTest) are driven by the
/// health monitoring side through [`TcTmEngine::set_su_state`].
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SuState {
    /// Powered off.
    #[default]
    Off,
    /// Power switched on, waiting for the supply to settle.
    StartSwitching,
    /// Power-up in progress.
    Switching,
    /// Powered and idle.
    On,
    /// Running its self test.
    SelfTest,
    /// Acquiring hits.
    Acquisition,
}

impl SuState {
    /// Whether the unit is between two stable states.
    pub fn in_transition(self) -> bool {
        matches!(
            self,
            SuState::StartSwitching | SuState::Switching | SuState::SelfTest
        )
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
enum MemoryType {
    Code,
    Data,
}

/// Memory write in progress.
#[derive(Clone, Copy, Debug)]
struct PendingSequence {
    msb: u8,
    lsb: u8,
    memory_type: MemoryType,
    buffer: [u8; MEMORY_BUFFER_SIZE],
    checksum: u8,
    fill: usize,
}

impl PendingSequence {
    const fn new() -> Self {
        Self {
            msb: 0,
            lsb: 0,
            memory_type: MemoryType::Data,
            buffer: [0; MEMORY_BUFFER_SIZE],
            checksum: 0,
            fill: 0,
        }
    }

    fn address(&self) -> u16 {
        u16::from_be_bytes([self.msb, self.lsb])
    }
}

/// Whether a whole memory transfer starting at `address` fits in `first..=last`.
fn window_fits(address: u16, first: u16, last: u16) -> bool {
    let end = address as u32 + MEMORY_BUFFER_SIZE as u32 - 1;
    address >= first && end <= last as u32
}

/// The TC/TM protocol engine.
///
/// ## Type Parameters
///
/// - `H`: The board services, see [`TcTmHardware`]
/// - `P`: A type implementing [`embedded_hal::digital::OutputPin`] driving one sensor unit's
///   power line
///
/// ## Notes
///
/// - Only one `TcTmEngine` instance should be active if you're using interrupts.
/// - The science store is held inline, so the engine is large; keep it in a `static`.
#[derive(Debug)]
pub struct TcTmEngine<H, P>
where
    H: TcTmHardware,
    P: OutputPin,
{
    /// Board services.
    pub hw: H,
    /// Sensor unit power lines.
    pub su_power: [P; NUM_SU],
    /// Housekeeping register image and live configuration.
    pub hk: TelemetryData,
    /// Science event store.
    pub science: ScienceStore,
    state: TcState,
    su_state: [SuState; NUM_SU],
    mailbox: Mailbox,
    pub(crate) cursor: TmCursor,
    pending: PendingSequence,
    pub(crate) dump_checksum: u8,
    internal_time: u32,
    new_time: u32,
    tc_timeout: Option<u32>,
    previous_tc: Option<u8>,
}

impl<H, P> TcTmEngine<H, P>
where
    H: TcTmHardware,
    P: OutputPin,
{
    /// Creates an engine in [`TcState::Handling`] with all sensor units powered off.
    ///
    /// # Arguments
    /// - `hw`: The board services
    /// - `su_power`: The sensor unit power lines, unit 1 first
    ///
    /// # Notes
    /// Every power line is driven `LOW` and the transmit interrupt is disabled.
    pub fn new(hw: H, su_power: [P; NUM_SU]) -> Self {
        let mut engine = Self {
            hw,
            su_power,
            hk: TelemetryData::new(),
            science: ScienceStore::new(),
            state: TcState::Handling,
            su_state: [SuState::Off; NUM_SU],
            mailbox: Mailbox::new(),
            cursor: TmCursor::idle(),
            pending: PendingSequence::new(),
            dump_checksum: 0,
            internal_time: 0,
            new_time: 0,
            tc_timeout: None,
            previous_tc: None,
        };
        engine.power_down();
        engine
    }

    /// Puts the engine back into its startup state in place, taking new board services.
    ///
    /// The science store is cleared where it lives.
    ///
    /// # Notes
    /// The previous board services and power lines are dropped.
    pub fn reset(&mut self, hw: H, su_power: [P; NUM_SU]) {
        self.hw = hw;
        self.su_power = su_power;
        self.hk = TelemetryData::new();
        self.science.clear();
        self.state = TcState::Handling;
        self.su_state = [SuState::Off; NUM_SU];
        self.mailbox = Mailbox::new();
        self.cursor = TmCursor::idle();
        self.pending = PendingSequence::new();
        self.dump_checksum = 0;
        self.internal_time = 0;
        self.new_time = 0;
        self.tc_timeout = None;
        self.previous_tc = None;
        self.power_down();
    }

    fn power_down(&mut self) {
        for pin in self.su_power.iter_mut() {
            let _ = pin.set_low();
        }
        self.hw.set_tm_interrupt(false);
    }

    /// Current sequencer state.
    pub fn state(&self) -> TcState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: TcState) {
        if self.state != state {
            debug!("tc state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Current telemetry cursor.
    pub fn cursor(&self) -> TmCursor {
        self.cursor
    }

    /// State of sensor unit `unit` (0-based).
    pub fn su_state(&self, unit: usize) -> Option<SuState> {
        self.su_state.get(unit).copied()
    }

    /// Updates the state of sensor unit `unit` (0-based).
    ///
    /// Used by the health monitoring side to complete power-up and self test.
    pub fn set_su_state(&mut self, unit: usize, state: SuState) {
        if let Some(s) = self.su_state.get_mut(unit) {
            *s = state;
        }
    }

    /// Instrument time.
    pub fn time(&self) -> u32 {
        self.internal_time
    }

    /// Advances the instrument time. Called from the time base interrupt.
    pub fn advance_time(&mut self, ticks: u32) {
        self.internal_time = self.internal_time.wrapping_add(ticks);
    }

    /// How long (in milliseconds) the task should wait for the next message.
    ///
    /// `None` means wait forever. A timeout is armed while a multi-word command sequence is in
    /// progress.
    pub fn wait_timeout(&self) -> Option<u32> {
        self.tc_timeout
    }

    /// Whether science telemetry is being sent.
    pub fn is_transmitting_science(&self) -> bool {
        self.state == TcState::ScienceTelemetry
    }

    /// Takes the next message for the task, or `WouldBlock` if there is none.
    pub fn take_mail(&mut self) -> nb::Result<Mail, Infallible> {
        self.mailbox.take()
    }

    /// Posts a message for the task.
    ///
    /// A message posted while the slot is occupied is lost and counted in
    /// `isr_send_message_error`.
    pub fn post(&mut self, mail: Mail) {
        if let Err(lost) = self.mailbox.post(mail) {
            self.hk.isr_send_message_error = self.hk.isr_send_message_error.saturating_add(1);
            error!("mailbox full, {:?} lost", lost.0);
        }
    }

    /// Records a hit in the science store.
    ///
    /// Hits arriving while science telemetry is being sent are deferred until it completes.
    pub fn record_event(&mut self, event: &EventRecord) -> Recorded {
        let transmitting = self.is_transmitting_science();
        self.science
            .record(event, transmitting, &mut self.hk.su_hits)
    }

    /// Writes a hit into a slot chosen beforehand (see
    /// [`isr::global_record_event`](crate::isr::global_record_event)).
    pub fn commit_event(&mut self, event: &EventRecord, slot: Slot) -> Recorded {
        self.science.commit(event, slot, &mut self.hk.su_hits)
    }

    /// Runs one step of the command task.
    ///
    /// # Arguments
    /// - `mail`: The message taken from the mailbox, or `None` if the wait timed out
    ///
    /// # Behavior
    /// Errors of the step are recorded as sticky bits in the error status register and revert
    /// the sequencer to [`TcState::Handling`].
    pub fn execute(&mut self, mail: Option<Mail>) {
        let Some(mail) = mail else {
            self.sequence_timeout();
            return;
        };
        let result = match self.state {
            TcState::Handling => self.handle(mail),
            TcState::ReadMemory => self.read_memory(mail),
            TcState::WriteMemory => self.write_memory(mail),
            TcState::MemoryPatch => self.memory_patch(mail),
            TcState::RegisterTelemetry
            | TcState::ScienceTelemetry
            | TcState::MemoryDump => self.telemetry_done(mail),
        };
        if let Err(e) = result {
            self.reject(e);
        }
    }

    fn reject(&mut self, error: TcError) {
        warn!("command rejected in {:?}: {}", self.state, error);
        self.hk.set_error(error.error_bit());
        self.previous_tc = None;
        self.enter_handling();
    }

    fn enter_handling(&mut self) {
        self.pending = PendingSequence::new();
        self.tc_timeout = None;
        self.set_state(TcState::Handling);
    }

    fn sequence_timeout(&mut self) {
        if self.state == TcState::Handling {
            self.previous_tc = None;
            self.tc_timeout = None;
        } else {
            self.reject(TcError::SequenceBroken);
        }
    }

    fn handle(&mut self, mail: Mail) -> Result<()> {
        let word = match mail {
            Mail::Command(word) => word,
            Mail::PatchWord(_) | Mail::TmReady => {
                trace!("stale {:?} ignored", mail);
                return Ok(());
            }
        };
        self.tc_timeout = None;
        let address = word.address();
        let result = self.dispatch(word);
        self.previous_tc = if result.is_ok() { Some(address) } else { None };
        result
    }

    fn dispatch(&mut self, word: CommandWord) -> Result<()> {
        let address = word.address();
        let code = word.code();
        match address {
            SEND_STATUS_REGISTER => {
                self.cursor = TmCursor::new(TmSource::Register, code as usize, HK_BLOCK_SIZE);
                self.set_state(TcState::RegisterTelemetry);
                self.hw.set_tm_interrupt(true);
            }
            SEND_SCIENCE_DATA_FILE => {
                if self.hk.mode() == Mode::SelfTest {
                    return Err(TcError::NotAllowed(address));
                }
                let end = self.science.prepare_downlink();
                self.cursor = TmCursor::new(TmSource::Science, 0, end);
                self.set_state(TcState::ScienceTelemetry);
                self.hw.set_tm_interrupt(true);
            }
            READ_DATA_MEMORY_MSB => {
                self.pending.msb = code;
                self.set_state(TcState::ReadMemory);
            }
            WRITE_CODE_MEMORY_MSB | WRITE_DATA_MEMORY_MSB => {
                if self.hk.mode() == Mode::Acquisition {
                    return Err(TcError::NotAllowed(address));
                }
                self.pending.msb = code;
                self.pending.memory_type = if address == WRITE_CODE_MEMORY_MSB {
                    MemoryType::Code
                } else {
                    MemoryType::Data
                };
                self.pending.checksum = code;
                self.tc_timeout = Some(SEQUENCE_TIMEOUT_MS);
                self.set_state(TcState::WriteMemory);
            }
            START_ACQUISITION => self.start_acquisition()?,
            STOP_ACQUISITION => self.stop_acquisition()?,
            SOFT_RESET => {
                debug!("soft reset requested");
                self.hw.reboot(ResetKind::Soft);
            }
            _ => self.update_configuration(address, code)?,
        }
        Ok(())
    }

    fn start_acquisition(&mut self) -> Result<()> {
        if self.hk.mode() != Mode::Standby || self.su_state.iter().any(|s| s.in_transition()) {
            return Err(TcError::NotAllowed(START_ACQUISITION));
        }
        for s in self.su_state.iter_mut().filter(|s| **s == SuState::On) {
            *s = SuState::Acquisition;
        }
        self.hw.reset_hit_trigger();
        self.hk.set_mode(Mode::Acquisition);
        debug!("acquisition started");
        Ok(())
    }

    fn stop_acquisition(&mut self) -> Result<()> {
        if self.hk.mode() != Mode::Acquisition {
            return Err(TcError::NotAllowed(STOP_ACQUISITION));
        }
        for s in self
            .su_state
            .iter_mut()
            .filter(|s| **s == SuState::Acquisition)
        {
            *s = SuState::On;
        }
        self.hk.set_mode(Mode::Standby);
        debug!("acquisition stopped");
        Ok(())
    }

    fn update_configuration(&mut self, address: u8, code: u8) -> Result<()> {
        match address {
            ERROR_STATUS_CLEAR => self.hk.clear_errors(),
            CLEAR_WATCHDOG_FAILURES => self.hk.watchdog_failures = 0,
            CLEAR_CHECKSUM_FAILURES => self.hk.checksum_failures = 0,
            SET_TIME_BYTE_0..=SET_TIME_BYTE_3 => self.set_time_byte(address, code)?,
            SET_COEFFICIENT_1..=SET_COEFFICIENT_5 => {
                self.hk.coefficient[(address - SET_COEFFICIENT_1) as usize] = code;
            }
            SWITCH_SU_1 | SWITCH_SU_2 | SWITCH_SU_3 | SWITCH_SU_4 => {
                self.switch_su(address, code)?
            }
            SWITCH_SU_1..=LAST_SU_PARAMETER => self.set_su_parameter(address, code)?,
            _ => return Err(TcError::NotAllowed(address)),
        }
        Ok(())
    }

    fn switch_su(&mut self, address: u8, code: u8) -> Result<()> {
        let unit = ((address - SWITCH_SU_1) >> 4) as usize;
        if self.hk.mode() == Mode::Acquisition {
            return Err(TcError::NotAllowed(address));
        }
        match code {
            ON_VALUE => {
                if self.su_state[unit] != SuState::Off
                    || self.su_state.iter().any(|s| s.in_transition())
                {
                    return Err(TcError::NotAllowed(address));
                }
                let _ = self.su_power[unit].set_high();
                self.su_state[unit] = SuState::StartSwitching;
            }
            OFF_VALUE => {
                let _ = self.su_power[unit].set_low();
                self.su_state[unit] = SuState::Off;
            }
            SELF_TEST => {
                if self.su_state[unit] != SuState::On {
                    return Err(TcError::NotAllowed(address));
                }
                self.su_state[unit] = SuState::SelfTest;
            }
            _ => return Err(TcError::InvalidCode { address, code }),
        }
        debug!("su {} -> {:?}", unit + 1, self.su_state[unit]);
        Ok(())
    }

    fn set_su_parameter(&mut self, address: u8, code: u8) -> Result<()> {
        let unit = ((address - SWITCH_SU_1) >> 4) as usize;
        let offset = address & 0x0F;
        let settings = &mut self.hk.su_settings[unit];
        let channel = match offset {
            PLASMA_1_PLUS_THRESHOLD_OFFSET => {
                settings.plasma_1_plus_threshold = code;
                TriggerChannel::Plasma1Plus
            }
            PLASMA_1_MINUS_THRESHOLD_OFFSET => {
                settings.plasma_1_minus_threshold = code;
                TriggerChannel::Plasma1Minus
            }
            PIEZO_THRESHOLD_OFFSET => {
                settings.piezo_threshold = code;
                TriggerChannel::Piezo
            }
            _ => {
                let level = (offset as usize)
                    .checked_sub(CLASS_LEVEL_OFFSET as usize)
                    .and_then(|i| settings.class_levels.get_mut(i))
                    .ok_or(TcError::NotAllowed(address))?;
                *level = code;
                return Ok(());
            }
        };
        self.hw.set_trigger_level(unit, channel, code);
        Ok(())
    }

    fn set_time_byte(&mut self, address: u8, code: u8) -> Result<()> {
        if address != SET_TIME_BYTE_3 && self.previous_tc != Some(address + 1) {
            return Err(TcError::SequenceBroken);
        }
        let shift = 8 * (address - SET_TIME_BYTE_0) as u32;
        self.new_time = (self.new_time & !(0xFF << shift)) | ((code as u32) << shift);
        if address == SET_TIME_BYTE_0 {
            self.internal_time = self.new_time;
            debug!("time set to {}", self.internal_time);
        } else {
            self.tc_timeout = Some(SEQUENCE_TIMEOUT_MS);
        }
        Ok(())
    }

    fn read_memory(&mut self, mail: Mail) -> Result<()> {
        let word = match mail {
            Mail::Command(word) if word.address() == READ_DATA_MEMORY_LSB => word,
            _ => return Err(TcError::SequenceBroken),
        };
        self.pending.lsb = word.code();
        let base = self.pending.address();
        if !window_fits(base, DATA_MEMORY_START, DATA_MEMORY_END) {
            return Err(TcError::AddressOutOfRange(base));
        }
        self.hw.write_telemetry(self.pending.msb, self.pending.lsb);
        self.dump_checksum = self.pending.msb ^ self.pending.lsb;
        self.cursor = TmCursor::new(TmSource::Memory { base }, 0, MEMORY_BUFFER_SIZE);
        self.set_state(TcState::MemoryDump);
        self.hw.set_tm_interrupt(true);
        Ok(())
    }

    fn write_memory(&mut self, mail: Mail) -> Result<()> {
        let expected = match self.pending.memory_type {
            MemoryType::Code => WRITE_CODE_MEMORY_LSB,
            MemoryType::Data => WRITE_DATA_MEMORY_LSB,
        };
        let word = match mail {
            Mail::Command(word) if word.address() == expected => word,
            _ => return Err(TcError::SequenceBroken),
        };
        self.pending.lsb = word.code();
        self.pending.checksum ^= word.code();
        self.pending.fill = 0;
        self.tc_timeout = Some(SEQUENCE_TIMEOUT_MS);
        self.set_state(TcState::MemoryPatch);
        Ok(())
    }

    fn memory_patch(&mut self, mail: Mail) -> Result<()> {
        let Mail::PatchWord(word) = mail else {
            return Err(TcError::SequenceBroken);
        };
        let pending = &mut self.pending;
        if pending.fill < MEMORY_BUFFER_SIZE {
            let (hi, lo) = (hi8(word), lo8(word));
            pending.buffer[pending.fill] = hi;
            pending.buffer[pending.fill + 1] = lo;
            pending.checksum ^= hi ^ lo;
            pending.fill += 2;
            return Ok(());
        }
        let (tag, checksum) = (hi8(word), lo8(word));
        if checksum != pending.checksum {
            return Err(TcError::MemoryChecksum);
        }
        let address = pending.address();
        let buffer = pending.buffer;
        let memory_type = pending.memory_type;
        match memory_type {
            MemoryType::Data => {
                if !window_fits(address, DATA_MEMORY_START, DATA_MEMORY_END) {
                    return Err(TcError::AddressOutOfRange(address));
                }
                self.enter_handling();
                self.hw.write_data_memory(address, &buffer);
            }
            MemoryType::Code => {
                if !window_fits(address, PATCH_AREA_START, PATCH_AREA_END) {
                    return Err(TcError::AddressOutOfRange(address));
                }
                let action =
                    PatchAction::from_tag(tag).ok_or(TcError::UnknownPatchAction(tag))?;
                self.enter_handling();
                debug!("code patch at {}, {:?}", address, action);
                self.hw.patch_code_memory(address, &buffer, action);
            }
        }
        Ok(())
    }

    fn telemetry_done(&mut self, mail: Mail) -> Result<()> {
        match (self.state, mail) {
            (TcState::ScienceTelemetry, Mail::TmReady) => {
                self.science.flush(&mut self.hk.su_hits);
                self.enter_handling();
            }
            (TcState::MemoryDump, Mail::TmReady) => self.enter_handling(),
            _ => trace!("{:?} ignored in {:?}", mail, self.state),
        }
        Ok(())
    }
}
