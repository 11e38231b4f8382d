mod common;

use common::*;
use impact_tctm::classify::{TcClass, class_of};
use impact_tctm::command::CommandWord;
use impact_tctm::consts::*;
use impact_tctm::housekeeping::Mode;
use impact_tctm::science::Recorded;
use impact_tctm::sequencer::SuState;
use impact_tctm::TcState;

#[test]
fn test_parity_failures_never_post() {
    for address in 0..=MAX_TC_ADDRESS {
        for code in [0x00, ON_VALUE, address] {
            let mut engine = engine();
            engine.hw.command_word = CommandWord::new(address, code).raw() ^ 0x0100;
            engine.tc_interrupt();

            assert!(engine.take_mail().is_err());
            assert_eq!(engine.hk.error_status, PARITY_ERROR);
            assert_eq!(engine.hw.telemetry.len(), 1);
            finish(&mut engine);
        }
    }
}

#[test]
fn test_invalid_addresses_never_post() {
    let mut invalid = 0;
    for address in (0..=MAX_TC_ADDRESS).filter(|a| class_of(*a) == TcClass::Invalid) {
        let mut engine = engine();
        engine.hw.command_word = CommandWord::new(address, address).raw();
        engine.tc_interrupt();

        assert!(engine.take_mail().is_err());
        assert_eq!(engine.hk.error_status, TC_ERROR);
        assert_eq!(engine.hw.telemetry, vec![(TC_ERROR, engine.hk.mode_status)]);
        finish(&mut engine);
        invalid += 1;
    }
    assert_eq!(invalid, 128 - 59);
}

#[test]
fn test_error_status_clear_twice() {
    let mut engine = engine();
    send_raw(&mut engine, CommandWord::new(SOFT_RESET, SOFT_RESET).raw() ^ 0x0100);
    send(&mut engine, STOP_ACQUISITION, STOP_ACQUISITION);
    assert_eq!(engine.hk.error_status, PARITY_ERROR | TC_ERROR);

    send(&mut engine, ERROR_STATUS_CLEAR, ERROR_STATUS_CLEAR);
    assert_eq!(engine.hk.error_status, 0);
    send(&mut engine, ERROR_STATUS_CLEAR, ERROR_STATUS_CLEAR);
    assert_eq!(engine.hk.error_status, 0);
    assert_eq!(engine.state(), TcState::Handling);
    finish(&mut engine);
}

#[test]
fn test_start_acquisition_with_all_units_on() {
    let mut engine = engine();
    for unit in 0..NUM_SU {
        engine.set_su_state(unit, SuState::On);
    }
    send(&mut engine, START_ACQUISITION, START_ACQUISITION);

    assert_eq!(engine.hk.mode(), Mode::Acquisition);
    assert_eq!(engine.hk.error_status, 0);
    for unit in 0..NUM_SU {
        assert_eq!(engine.su_state(unit), Some(SuState::Acquisition));
    }
    assert_eq!(engine.hw.trigger_resets, 1);
    finish(&mut engine);
}

#[test]
fn test_data_patch_with_bad_checksum_leaves_memory() {
    let mut engine = engine();
    let before = engine.hw.memory.clone();
    let payload: [u16; 16] = core::array::from_fn(|i| 0xa500 | i as u16);
    let checksum = payload
        .iter()
        .fold(0x40 ^ 0x00, |c, w| c ^ (w >> 8) as u8 ^ *w as u8);

    send(&mut engine, WRITE_DATA_MEMORY_MSB, 0x40);
    send(&mut engine, WRITE_DATA_MEMORY_LSB, 0x00);
    for word in payload {
        send_raw(&mut engine, word);
    }
    send_raw(&mut engine, (checksum ^ 0xff) as u16);

    assert_eq!(engine.hk.error_status, MEMORY_WRITE_ERROR);
    assert_eq!(engine.state(), TcState::Handling);
    assert_eq!(engine.wait_timeout(), None);
    assert!(engine.hw.memory == before);
    finish(&mut engine);
}

#[test]
fn test_data_patch_writes_memory() {
    let mut engine = engine();
    let payload: [u16; 16] = core::array::from_fn(|i| 0x1100 * (i as u16 % 8) + 0x22);
    let checksum = payload
        .iter()
        .fold(0x40 ^ 0x20, |c, w| c ^ (w >> 8) as u8 ^ *w as u8);

    send(&mut engine, WRITE_DATA_MEMORY_MSB, 0x40);
    send(&mut engine, WRITE_DATA_MEMORY_LSB, 0x20);
    assert_eq!(engine.state(), TcState::MemoryPatch);
    assert_eq!(engine.wait_timeout(), Some(SEQUENCE_TIMEOUT_MS));
    for word in payload {
        send_raw(&mut engine, word);
    }
    send_raw(&mut engine, checksum as u16);

    assert_eq!(engine.hk.error_status, 0);
    assert_eq!(engine.state(), TcState::Handling);
    let expected: Vec<u8> = payload.iter().flat_map(|w| w.to_be_bytes()).collect();
    assert_eq!(engine.hw.memory[0x4020..0x4040], expected[..]);
    finish(&mut engine);
}

#[test]
fn test_science_round_trip() {
    let mut engine = engine();
    let n = 7;
    for i in 0..n {
        let event = hit(100 + i as u16, (i % 4) as u8, (i % 10) as u8, 1000 + i);
        assert_eq!(engine.record_event(&event), Recorded::Stored(i as usize));
    }

    send(&mut engine, SEND_SCIENCE_DATA_FILE, SEND_SCIENCE_DATA_FILE);
    assert_eq!(engine.state(), TcState::ScienceTelemetry);
    drain_telemetry(&mut engine);
    let bytes = stream(&engine.hw.telemetry);

    let length = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    assert_eq!(length, bytes.len());
    assert_eq!((length - SCIENCE_HEADER_SIZE) / EVENT_RECORD_SIZE, n as usize);

    let counters = &bytes[SCIENCE_COUNTERS_INDEX..SCIENCE_NOT_USED_INDEX];
    assert_eq!(counters.iter().map(|c| *c as usize).sum::<usize>(), n as usize);
    let xor = counters.iter().fold(0, |x, c| x ^ c);
    assert_eq!(bytes[COUNTER_CHECKSUM_INDEX], xor);

    for record in bytes[SCIENCE_HEADER_SIZE..].chunks(EVENT_RECORD_SIZE) {
        let checksum = record[..EVENT_RECORD_SIZE - 1].iter().fold(0, |x, b| x ^ b);
        assert_eq!(record[EVENT_RECORD_SIZE - 1], checksum);
    }

    complete_transmission(&mut engine);
    assert_eq!(engine.state(), TcState::Handling);
    finish(&mut engine);
}

#[test]
fn test_hits_during_science_downlink_are_deferred() {
    let mut engine = engine();
    for i in 0..3 {
        let _ = engine.record_event(&hit(50, 2, 5, i));
    }
    let hits_before = engine.hk.su_hits[2];
    let counter_before = engine.science.counter(2, 5);

    send(&mut engine, SEND_SCIENCE_DATA_FILE, SEND_SCIENCE_DATA_FILE);
    let mut outcomes = Vec::new();
    for i in 0..12 {
        outcomes.push(engine.record_event(&hit(60 + i as u16, 2, 5, 100 + i)));
        engine.tm_interrupt();
    }
    assert_eq!(
        outcomes.iter().filter(|r| **r == Recorded::Deferred).count(),
        MAX_QUEUE_LENGTH
    );
    assert_eq!(outcomes.iter().filter(|r| **r == Recorded::Dropped).count(), 2);
    assert_eq!(engine.science.len(), 3);

    complete_transmission(&mut engine);
    assert_eq!(engine.state(), TcState::Handling);
    assert_eq!(engine.science.len(), 3 + MAX_QUEUE_LENGTH);
    assert_eq!(engine.hk.su_hits[2] - hits_before, MAX_QUEUE_LENGTH as u16);
    assert_eq!(
        engine.science.counter(2, 5) - counter_before,
        MAX_QUEUE_LENGTH as u8
    );
    assert!(engine.science.queued().is_empty());
    finish(&mut engine);
}

#[test]
fn test_full_register_block() {
    let mut engine = engine();
    send(&mut engine, SET_TIME_BYTE_3, 0x00);
    send(&mut engine, SET_TIME_BYTE_2, 0x00);
    send(&mut engine, SET_TIME_BYTE_1, 0x10);
    send(&mut engine, SET_TIME_BYTE_0, 0x20);
    send(&mut engine, SEND_STATUS_REGISTER, 0);

    for _ in 0..HK_BLOCK_SIZE / 2 {
        engine.tm_interrupt();
    }
    let bytes = stream(&engine.hw.telemetry);
    assert_eq!(bytes, engine.hk.to_bytes());
    assert_eq!(&bytes[TIME_INDEX..TIME_INDEX + 4], &[0x00, 0x00, 0x10, 0x20]);
    assert_eq!(bytes[SW_VERSION_INDEX], SW_VERSION);

    // keeps going from register 0 until the next command
    engine.tm_interrupt();
    assert_eq!(engine.hw.telemetry.len(), HK_BLOCK_SIZE / 2 + 1);
    assert_eq!(engine.hw.telemetry[HK_BLOCK_SIZE / 2], engine.hw.telemetry[0]);
    assert!(engine.take_mail().is_err());
    finish(&mut engine);
}
