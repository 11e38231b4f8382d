//! # impact-tctm
//!
//! A portable, no_std Rust implementation of the telecommand/telemetry (TC/TM) protocol engine
//! and science event store of a dust impact detector instrument.
//!
//! The engine is split the same way the instrument splits its execution contexts:
//! - a **command decoder** running in the command-arrival interrupt
//! - a **telemetry transmitter** running in the transmit-ready interrupt
//! - a **command execution sequencer** running as the single cooperative task
//! - a **science event store** fed by the (external) acquisition component
//!
//! All state shared between these contexts lives in one [`TcTmEngine`](sequencer::TcTmEngine)
//! value. On target it is kept in a `critical_section::Mutex` (see [`isr`]).
//!
//! ## Crate features
//! | Feature         | Description |
//! |-----------------|-------------|
//! | `std`           | Disables `#![no_std]` support |
//! | `isr` (default) | Global engine helpers and ISR entry points built on `critical_section::with` |
//! | `defmt-0-3`     | Uses `defmt` logging |
//! | `log`           | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use impact_tctm::init_tctm_engine;
//!
//! init_tctm_engine!(Board, SuPowerPin);
//!
//! #[interrupt]
//! fn TC_IRQ() {
//!     impact_tctm::tc_interrupt!();
//! }
//!
//! #[interrupt]
//! fn TM_IRQ() {
//!     impact_tctm::tm_interrupt!();
//! }
//!
//! fn main() -> ! {
//!     impact_tctm::isr::global_engine_setup(&TCTM_ENGINE, board, su_power_pins);
//!     impact_tctm::isr::run_tc_task_loop(&TCTM_ENGINE, &mut delay)
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - Only one engine instance should be active at a time in interrupt-driven mode.
//! - The hardware layer (command registers, telemetry registers, data memory, trigger levels)
//!   is reached exclusively through [`hal::TcTmHardware`].
//! - Sensor unit power lines are plain `embedded-hal` output pins.
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[cfg(feature = "isr")]
pub use critical_section;

pub use heapless;

#[macro_use]
mod fmt;

pub mod classify;
pub mod command;
pub mod consts;
pub mod decoder;
pub mod error;
pub mod hal;
pub mod housekeeping;
#[cfg(feature = "isr")]
pub mod isr;
pub mod mailbox;
pub(crate) mod parity;
pub mod science;
pub mod sequencer;
pub mod telemetry;
#[cfg(any(test, feature = "std"))]
#[doc(hidden)]
pub mod testing;
pub mod transmitter;

pub use error::{Result, TcError};
pub use sequencer::{TcState, TcTmEngine};
