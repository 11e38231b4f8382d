#![allow(dead_code)]

use embedded_hal_mock::eh1::digital::{
    Mock as PinMock, State as PinState, Transaction as PinTransaction,
};
use impact_tctm::command::CommandWord;
use impact_tctm::consts::NUM_SU;
use impact_tctm::science::EventRecord;
pub use impact_tctm::testing::FakeHardware;
use impact_tctm::TcTmEngine;

pub type Engine = TcTmEngine<FakeHardware, PinMock>;

/// Power lines expecting only the boot-time `LOW`.
pub fn idle_pins() -> [PinMock; NUM_SU] {
    core::array::from_fn(|_| PinMock::new(&[PinTransaction::set(PinState::Low)]))
}

pub fn engine() -> Engine {
    TcTmEngine::new(FakeHardware::new(), idle_pins())
}

pub fn finish(engine: &mut Engine) {
    for pin in engine.su_power.iter_mut() {
        pin.done();
    }
}

/// Raises a command interrupt for `raw` and runs the task on whatever was posted.
pub fn send_raw(engine: &mut Engine, raw: u16) {
    engine.hw.command_word = raw;
    engine.tc_interrupt();
    if let Ok(mail) = engine.take_mail() {
        engine.execute(Some(mail));
    }
}

pub fn send(engine: &mut Engine, address: u8, code: u8) {
    send_raw(engine, CommandWord::new(address, code).raw());
}

/// Drives transmit interrupts until the transmitter disables itself.
pub fn drain_telemetry(engine: &mut Engine) {
    while engine.hw.tm_interrupt {
        engine.tm_interrupt();
    }
}

/// Runs the task on the completion message of the last transmission.
pub fn complete_transmission(engine: &mut Engine) {
    drain_telemetry(engine);
    if let Ok(mail) = engine.take_mail() {
        engine.execute(Some(mail));
    }
}

pub fn hit(quality: u16, unit: u8, class: u8, time: u32) -> EventRecord {
    let mut event = EventRecord {
        quality_number: quality,
        su_number: unit,
        classification: class,
        hit_time: time,
        su_temperature_1: 21,
        plasma_1_plus: 0x0400 + quality,
        rise_time: 3,
        ..EventRecord::EMPTY
    };
    event.seal();
    event
}

/// Flattens the telemetry words into the byte stream.
pub fn stream(telemetry: &[(u8, u8)]) -> Vec<u8> {
    telemetry.iter().flat_map(|&(msb, lsb)| [msb, lsb]).collect()
}
