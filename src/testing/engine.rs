//! Engine constructors and command helpers for the unit tests.

use embedded_hal::digital::OutputPin;
use embedded_hal_mock::eh1::digital::{
    Mock as PinMock, State as PinState, Transaction as PinTransaction,
};

use super::FakeHardware;
use crate::command::CommandWord;
use crate::consts::NUM_SU;
use crate::parity::{hi8, lo8};
use crate::sequencer::TcTmEngine;

pub(crate) type TestEngine = TcTmEngine<FakeHardware, PinMock>;

/// Engine whose power lines expect the boot-time `LOW` followed by `extra[unit]`.
pub(crate) fn engine_with_pins(extra: [&[PinTransaction]; NUM_SU]) -> TestEngine {
    let pins = extra.map(|expected| {
        let mut transactions = vec![PinTransaction::set(PinState::Low)];
        transactions.extend_from_slice(expected);
        PinMock::new(&transactions)
    });
    TcTmEngine::new(FakeHardware::new(), pins)
}

pub(crate) fn engine() -> TestEngine {
    engine_with_pins([&[], &[], &[], &[]])
}

pub(crate) fn finish(engine: &mut TestEngine) {
    for pin in engine.su_power.iter_mut() {
        pin.done();
    }
}

/// Raises a command interrupt for `raw` and runs the task on whatever was posted.
pub(crate) fn send_raw<P: OutputPin>(engine: &mut TcTmEngine<FakeHardware, P>, raw: u16) {
    engine.hw.command_word = raw;
    engine.tc_interrupt();
    if let Ok(mail) = engine.take_mail() {
        engine.execute(Some(mail));
    }
}

pub(crate) fn run<P: OutputPin>(engine: &mut TcTmEngine<FakeHardware, P>, word: CommandWord) {
    send_raw(engine, word.raw());
}

/// Sends a full memory write sequence: address commands, payload, final word.
pub(crate) fn patch<P: OutputPin>(
    engine: &mut TcTmEngine<FakeHardware, P>,
    (msb_command, lsb_command): (u8, u8),
    address: u16,
    payload: &[u16; 16],
    final_word: u16,
) {
    run(engine, CommandWord::new(msb_command, hi8(address)));
    run(engine, CommandWord::new(lsb_command, lo8(address)));
    for word in payload {
        send_raw(engine, *word);
    }
    send_raw(engine, final_word);
}

pub(crate) fn patch_checksum(msb: u8, lsb: u8, payload: &[u16]) -> u8 {
    payload
        .iter()
        .fold(msb ^ lsb, |checksum, word| checksum ^ hi8(*word) ^ lo8(*word))
}

/// Drives transmit interrupts until the transmitter disables itself, at most `limit` times.
pub(crate) fn drain_telemetry<P: OutputPin>(
    engine: &mut TcTmEngine<FakeHardware, P>,
    limit: usize,
) {
    for _ in 0..limit {
        if !engine.hw.tm_interrupt {
            break;
        }
        engine.tm_interrupt();
    }
}
