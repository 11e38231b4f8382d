//! Interrupt-driven engine glue.
//!
//! Keeps the single [`TcTmEngine`](crate::sequencer::TcTmEngine) in a
//! `critical_section::Mutex<RefCell<Option<_>>>` shared by the two interrupt handlers and the
//! command task (feature `isr`).
//!
//! Contains:
//! - `global_engine_init` / `init_tctm_engine!`: declare the global engine
//! - `global_engine_setup` / `setup_tctm_engine!`: construct it at startup
//! - `global_tc_interrupt` / `tc_interrupt!`, `global_tm_interrupt` / `tm_interrupt!`: ISR
//!   entry points
//! - `global_record_event`: event recording for the acquisition side
//! - `global_wait_mail`, `global_task_step`, `run_tc_task_loop`: the command task, blocking on
//!   the mailbox with an `embedded_hal::delay::DelayNs` poll

mod global;
#[cfg_attr(feature = "isr", allow(unused_imports))]
pub use global::*;

mod macros;
