mod common;

use common::*;
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::digital::Mock as PinMock;
use impact_tctm::command::CommandWord;
use impact_tctm::consts::*;
use impact_tctm::isr::{self, GlobalEngine};
use impact_tctm::mailbox::Mail;
use impact_tctm::science::Recorded;
use impact_tctm::{TcState, init_tctm_engine, setup_tctm_engine, tc_interrupt, tm_interrupt};

fn set_command(engine: &'static GlobalEngine<FakeHardware, PinMock>, word: CommandWord) {
    let _ = isr::with_engine(engine, |e| e.hw.command_word = word.raw());
}

fn release_pins(engine: &'static GlobalEngine<FakeHardware, PinMock>) {
    let _ = isr::with_engine(engine, |e| finish(e));
}

#[test]
fn test_engine_absent_before_setup() {
    static ENGINE: GlobalEngine<FakeHardware, PinMock> = isr::global_engine_init();
    isr::global_tc_interrupt(&ENGINE);
    isr::global_tm_interrupt(&ENGINE);
    assert_eq!(isr::global_record_event(&ENGINE, &hit(1, 0, 0, 0)), None);
    assert_eq!(isr::with_engine(&ENGINE, |e| e.state()), None);
}

#[test]
fn test_command_through_task_step() {
    static ENGINE: GlobalEngine<FakeHardware, PinMock> = isr::global_engine_init();
    isr::global_engine_setup(&ENGINE, FakeHardware::new(), idle_pins());
    let mut delay = NoopDelay::new();

    set_command(&ENGINE, CommandWord::new(SET_COEFFICIENT_5, 0x42));
    isr::global_tc_interrupt(&ENGINE);
    isr::global_task_step(&ENGINE, &mut delay);

    assert_eq!(isr::with_engine(&ENGINE, |e| e.hk.coefficient[4]), Some(0x42));
    release_pins(&ENGINE);
}

#[test]
fn test_wait_times_out_during_sequence() {
    static ENGINE: GlobalEngine<FakeHardware, PinMock> = isr::global_engine_init();
    isr::global_engine_setup(&ENGINE, FakeHardware::new(), idle_pins());
    let mut delay = NoopDelay::new();

    set_command(&ENGINE, CommandWord::new(WRITE_CODE_MEMORY_MSB, 0x20));
    isr::global_tc_interrupt(&ENGINE);
    isr::global_task_step(&ENGINE, &mut delay);
    assert_eq!(
        isr::with_engine(&ENGINE, |e| e.state()),
        Some(TcState::WriteMemory)
    );

    // nothing arrives: the armed timeout expires
    assert_eq!(isr::global_wait_mail(&ENGINE, &mut delay), None);
    isr::global_task_step(&ENGINE, &mut delay);
    assert_eq!(
        isr::with_engine(&ENGINE, |e| (e.state(), e.hk.error_status)),
        Some((TcState::Handling, TC_ERROR))
    );
    release_pins(&ENGINE);
}

#[test]
fn test_memory_dump_through_interrupts() {
    static ENGINE: GlobalEngine<FakeHardware, PinMock> = isr::global_engine_init();
    isr::global_engine_setup(&ENGINE, FakeHardware::new(), idle_pins());
    let mut delay = NoopDelay::new();

    for word in [
        CommandWord::new(READ_DATA_MEMORY_MSB, 0x02),
        CommandWord::new(READ_DATA_MEMORY_LSB, 0x00),
    ] {
        set_command(&ENGINE, word);
        isr::global_tc_interrupt(&ENGINE);
        isr::global_task_step(&ENGINE, &mut delay);
    }
    while isr::with_engine(&ENGINE, |e| e.hw.tm_interrupt) == Some(true) {
        isr::global_tm_interrupt(&ENGINE);
    }
    assert_eq!(isr::global_wait_mail(&ENGINE, &mut delay), Some(Mail::TmReady));

    let sent = isr::with_engine(&ENGINE, |e| e.hw.telemetry.len());
    assert_eq!(sent, Some(1 + MEMORY_BUFFER_SIZE / 2 + 1));
    release_pins(&ENGINE);
}

#[test]
fn test_record_event_replaces_weakest_in_full_store() {
    static ENGINE: GlobalEngine<FakeHardware, PinMock> = isr::global_engine_init();
    isr::global_engine_setup(&ENGINE, FakeHardware::new(), idle_pins());

    for i in 0..MAX_EVENTS {
        let quality = if i == 700 { 3 } else { 10 + (i % 50) as u16 };
        let recorded = isr::global_record_event(&ENGINE, &hit(quality, 0, 0, i as u32));
        assert_eq!(recorded, Some(Recorded::Stored(i)));
    }

    let recorded = isr::global_record_event(&ENGINE, &hit(200, 1, 1, 5000));
    assert_eq!(recorded, Some(Recorded::Stored(700)));
    let recorded = isr::global_record_event(&ENGINE, &hit(1, 1, 1, 5001));
    assert_eq!(recorded, Some(Recorded::Kept(0)));

    let counted = isr::with_engine(&ENGINE, |e| (e.science.counter(1, 1), e.hk.su_hits[1]));
    assert_eq!(counted, Some((2, 2)));
    release_pins(&ENGINE);
}

#[test]
fn test_record_event_defers_during_science_downlink() {
    static ENGINE: GlobalEngine<FakeHardware, PinMock> = isr::global_engine_init();
    isr::global_engine_setup(&ENGINE, FakeHardware::new(), idle_pins());
    let mut delay = NoopDelay::new();

    set_command(
        &ENGINE,
        CommandWord::new(SEND_SCIENCE_DATA_FILE, SEND_SCIENCE_DATA_FILE),
    );
    isr::global_tc_interrupt(&ENGINE);
    isr::global_task_step(&ENGINE, &mut delay);

    assert_eq!(
        isr::global_record_event(&ENGINE, &hit(9, 0, 0, 1)),
        Some(Recorded::Deferred)
    );
    release_pins(&ENGINE);
}

#[test]
fn test_setup_again_resets_in_place() {
    static ENGINE: GlobalEngine<FakeHardware, PinMock> = isr::global_engine_init();
    isr::global_engine_setup(&ENGINE, FakeHardware::new(), idle_pins());
    let _ = isr::global_record_event(&ENGINE, &hit(5, 0, 0, 1));
    isr::global_advance_time(&ENGINE, 42);
    release_pins(&ENGINE);

    isr::global_engine_setup(&ENGINE, FakeHardware::new(), idle_pins());
    let fresh = isr::with_engine(&ENGINE, |e| (e.science.len(), e.time(), e.hk.su_hits[0]));
    assert_eq!(fresh, Some((0, 0, 0)));
    assert_eq!(
        isr::global_record_event(&ENGINE, &hit(5, 0, 0, 2)),
        Some(Recorded::Stored(0))
    );
    release_pins(&ENGINE);
}

mod macros {
    use super::*;

    init_tctm_engine!(FakeHardware, PinMock);

    #[test]
    fn test_macro_entry_points() {
        setup_tctm_engine!(FakeHardware::new(), idle_pins());
        let _ = isr::with_engine(&TCTM_ENGINE, |e| {
            e.hw.command_word = CommandWord::new(SEND_STATUS_REGISTER, 0).raw();
        });

        tc_interrupt!();
        let mail = isr::with_engine(&TCTM_ENGINE, |e| e.take_mail().ok()).flatten();
        assert!(matches!(mail, Some(Mail::Command(_))));
        let _ = isr::with_engine(&TCTM_ENGINE, |e| e.execute(mail));

        tm_interrupt!();
        tm_interrupt!(TCTM_ENGINE);
        let sent = isr::with_engine(&TCTM_ENGINE, |e| e.hw.telemetry.len());
        assert_eq!(sent, Some(2));
        release_pins(&TCTM_ENGINE);
    }
}
