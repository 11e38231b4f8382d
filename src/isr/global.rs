use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::consts::{NUM_SU, POLL_INTERVAL_US, RECORD_SEARCH_CHUNK};
use crate::hal::TcTmHardware;
use crate::mailbox::Mail;
use crate::science::{EventRecord, Recorded, Slot};
use crate::sequencer::TcTmEngine;

/// The global engine cell.
pub type GlobalEngine<H, P> = Mutex<RefCell<Option<TcTmEngine<H, P>>>>;

/// Used to initialize the global static `TcTmEngine` for use with `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```rust,ignore
/// use impact_tctm::isr::{GlobalEngine, global_engine_init};
///
/// static TCTM_ENGINE: GlobalEngine<Board, SuPowerPin> = global_engine_init();
/// ```
pub const fn global_engine_init<H: TcTmHardware, P: OutputPin>() -> GlobalEngine<H, P> {
    Mutex::new(RefCell::new(None))
}

/// Sets up the engine inside the global cell.
///
/// The first call moves a new engine into the cell. Later calls reset the existing engine in
/// place with [`TcTmEngine::reset`].
///
/// # Arguments
/// * The global static `TcTmEngine`
/// * The board services
/// * The sensor unit power lines, unit 1 first
pub fn global_engine_setup<H: TcTmHardware, P: OutputPin>(
    global_engine: &'static GlobalEngine<H, P>,
    hw: H,
    su_power: [P; NUM_SU],
) {
    critical_section::with(|cs| {
        let mut cell = global_engine.borrow(cs).borrow_mut();
        if let Some(engine) = cell.as_mut() {
            engine.reset(hw, su_power);
        } else {
            *cell = Some(TcTmEngine::new(hw, su_power));
        }
    });
}

/// Runs `f` on the engine inside a critical section.
///
/// # Returns
/// `None` if the engine has not been set up yet.
pub fn with_engine<H, P, R>(
    global_engine: &'static GlobalEngine<H, P>,
    f: impl FnOnce(&mut TcTmEngine<H, P>) -> R,
) -> Option<R>
where
    H: TcTmHardware,
    P: OutputPin,
{
    critical_section::with(|cs| global_engine.borrow(cs).borrow_mut().as_mut().map(f))
}

/// Command-arrival interrupt entry point.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TC_IRQ() {
///     global_tc_interrupt(&TCTM_ENGINE);
/// }
/// ```
pub fn global_tc_interrupt<H: TcTmHardware, P: OutputPin>(
    global_engine: &'static GlobalEngine<H, P>,
) {
    let _ = with_engine(global_engine, |engine| engine.tc_interrupt());
}

/// Transmit-ready interrupt entry point.
pub fn global_tm_interrupt<H: TcTmHardware, P: OutputPin>(
    global_engine: &'static GlobalEngine<H, P>,
) {
    let _ = with_engine(global_engine, |engine| engine.tm_interrupt());
}

/// Advances the instrument time from the time base interrupt.
pub fn global_advance_time<H: TcTmHardware, P: OutputPin>(
    global_engine: &'static GlobalEngine<H, P>,
    ticks: u32,
) {
    let _ = with_engine(global_engine, |engine| engine.advance_time(ticks));
}

/// Records a hit from the acquisition side.
///
/// The slot decision and the write each run in their own critical section. When the store is
/// full, the search for the slot to replace runs in chunks of [`RECORD_SEARCH_CHUNK`] slots with
/// interrupts enabled in between; if committed storage changed meanwhile the search starts
/// over.
///
/// # Returns
/// `None` if the engine has not been set up yet.
pub fn global_record_event<H: TcTmHardware, P: OutputPin>(
    global_engine: &'static GlobalEngine<H, P>,
    event: &EventRecord,
) -> Option<Recorded> {
    loop {
        let decision = with_engine(global_engine, |engine| {
            if engine.science.is_full() && !engine.is_transmitting_science() {
                Ok((engine.science.len(), engine.science.generation()))
            } else {
                Err(engine.record_event(event))
            }
        })?;
        let (len, generation) = match decision {
            Ok(search) => search,
            Err(recorded) => return Some(recorded),
        };

        let mut weakest: Option<(usize, (u16, u32))> = None;
        let mut stale = false;
        let mut start = 0;
        while start < len {
            let end = (start + RECORD_SEARCH_CHUNK).min(len);
            let candidate = with_engine(global_engine, |engine| {
                if engine.science.generation() != generation {
                    return Err(());
                }
                Ok(engine
                    .science
                    .weakest_in(start..end)
                    .and_then(|i| engine.science.rank_of(i).map(|rank| (i, rank))))
            })?;
            match candidate {
                Err(()) => {
                    stale = true;
                    break;
                }
                Ok(Some((i, rank))) => {
                    if weakest.is_none_or(|(_, best)| rank < best) {
                        weakest = Some((i, rank));
                    }
                }
                Ok(None) => {}
            }
            start = end;
        }
        if stale {
            trace!("store changed during slot search, retrying");
            continue;
        }
        let Some((slot, _)) = weakest else {
            return Some(Recorded::Dropped);
        };

        let committed = with_engine(global_engine, |engine| {
            if engine.science.generation() != generation {
                None
            } else if engine.is_transmitting_science() {
                Some(engine.record_event(event))
            } else {
                Some(engine.commit_event(event, Slot::Replace(slot)))
            }
        })?;
        if let Some(recorded) = committed {
            return Some(recorded);
        }
    }
}

/// Waits for the next message for the command task.
///
/// The wait timeout is read from the engine when the wait starts; the mailbox is polled every
/// [`POLL_INTERVAL_US`] outside the critical section so both interrupts keep being serviced.
///
/// # Returns
/// - `Some(mail)` once a message is available
/// - `None` once the armed sequence timeout expires
pub fn global_wait_mail<H, P, D>(
    global_engine: &'static GlobalEngine<H, P>,
    delay: &mut D,
) -> Option<Mail>
where
    H: TcTmHardware,
    P: OutputPin,
    D: DelayNs,
{
    let timeout_us = with_engine(global_engine, |engine| engine.wait_timeout())
        .flatten()
        .map(|ms| ms.saturating_mul(1_000));
    let mut waited_us: u32 = 0;
    loop {
        if let Some(Ok(mail)) = with_engine(global_engine, |engine| engine.take_mail()) {
            return Some(mail);
        }
        if timeout_us.is_some_and(|limit| waited_us >= limit) {
            return None;
        }
        delay.delay_us(POLL_INTERVAL_US);
        waited_us = waited_us.saturating_add(POLL_INTERVAL_US);
    }
}

/// Runs one step of the command task: waits for a message (or the timeout), then executes it.
pub fn global_task_step<H, P, D>(global_engine: &'static GlobalEngine<H, P>, delay: &mut D)
where
    H: TcTmHardware,
    P: OutputPin,
    D: DelayNs,
{
    let mail = global_wait_mail(global_engine, delay);
    let _ = with_engine(global_engine, |engine| engine.execute(mail));
}

/// Runs the command task forever.
///
/// # Example
/// ```rust,ignore
/// fn main() -> ! {
///     global_engine_setup(&TCTM_ENGINE, board, su_power_pins);
///     run_tc_task_loop(&TCTM_ENGINE, &mut delay)
/// }
/// ```
///
/// # Notes
/// - This loop will never return; it is intended for single-purpose polling firmware.
pub fn run_tc_task_loop<H, P, D>(global_engine: &'static GlobalEngine<H, P>, delay: &mut D) -> !
where
    H: TcTmHardware,
    P: OutputPin,
    D: DelayNs,
{
    loop {
        global_task_step(global_engine, delay);
    }
}
