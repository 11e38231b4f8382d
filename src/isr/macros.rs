/// Declares a static global `TCTM_ENGINE` instance protected by a `critical_section` mutex.
///
/// This macro creates a `static` singleton `TCTM_ENGINE` suitable for use in interrupt-based
/// environments, where the command task and both ISRs need to share the engine state.
///
/// # Arguments
/// - `$hw`: The concrete board type (must implement `TcTmHardware`)
/// - `$pin`: The concrete sensor unit power pin type (must implement `OutputPin`)
///
/// # Example
/// ```rust,ignore
/// init_tctm_engine!(Board, SuPowerPin);
/// ```
#[macro_export]
macro_rules! init_tctm_engine {
    ( $hw:ty, $pin:ty ) => {
        pub static TCTM_ENGINE: $crate::isr::GlobalEngine<$hw, $pin> =
            $crate::isr::global_engine_init();
    };
}

/// Constructs the engine inside the global `TCTM_ENGINE`.
///
/// # Example
/// ```rust,ignore
/// setup_tctm_engine!(board, [su1, su2, su3, su4]);
/// ```
///
/// # Notes
/// - Requires `init_tctm_engine!` to have been used earlier.
#[macro_export]
macro_rules! setup_tctm_engine {
    ( $hw:expr, $pins:expr ) => {
        $crate::isr::global_engine_setup(&TCTM_ENGINE, $hw, $pins)
    };
}

/// Runs the command decoder on the global `TCTM_ENGINE` if it has been set up.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TC_IRQ() {
///     tc_interrupt!();
/// }
/// ```
///
/// # Notes
/// - Safe to call before setup; does nothing until the engine exists.
#[macro_export]
macro_rules! tc_interrupt {
    () => {
        $crate::isr::global_tc_interrupt(&TCTM_ENGINE)
    };
    ( $engine:expr ) => {
        $crate::isr::global_tc_interrupt(&$engine)
    };
}

/// Runs the telemetry transmitter on the global `TCTM_ENGINE` if it has been set up.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TM_IRQ() {
///     tm_interrupt!();
/// }
/// ```
#[macro_export]
macro_rules! tm_interrupt {
    () => {
        $crate::isr::global_tm_interrupt(&TCTM_ENGINE)
    };
    ( $engine:expr ) => {
        $crate::isr::global_tm_interrupt(&$engine)
    };
}
