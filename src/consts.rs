//! Constants used across the TC/TM protocol implementation.
//!
//! This module defines the command address map, the command code values with special meaning,
//! the sticky error bits, the housekeeping register layout, the science block layout, memory
//! ranges and the buffer capacities of the engine.
//!
//! ## Key Concepts
//!
//! - **Addresses**: 7-bit command addresses. Anything not listed here is invalid.
//! - **Register offsets**: byte offsets into the housekeeping telemetry block. The block is sent
//!   two bytes per transmit interrupt, so its size and [`TIME_INDEX`] are even.
//! - **Capacities**: fixed sizes of the science store and its deferred queue.
//!
//! These values should be used wherever framing or buffer logic is implemented to ensure
//! consistent message boundaries on both sides of the link.

// ---------------------------------------------------------------------------
// Command addresses
// ---------------------------------------------------------------------------

/// Start hit acquisition. Code must equal the address.
pub const START_ACQUISITION: u8 = 0x01;
/// Stop hit acquisition. Code must equal the address.
pub const STOP_ACQUISITION: u8 = 0x02;
/// Clear the sticky error bits. Code must equal the address.
pub const ERROR_STATUS_CLEAR: u8 = 0x03;
/// Send the housekeeping registers, starting at the register given as code.
pub const SEND_STATUS_REGISTER: u8 = 0x05;
/// Send the science data file. Code must equal the address.
pub const SEND_SCIENCE_DATA_FILE: u8 = 0x06;
/// Reboot the processor. Code must equal the address.
pub const SOFT_RESET: u8 = 0x09;
/// Zero the watchdog failure counter. Code must equal the address.
pub const CLEAR_WATCHDOG_FAILURES: u8 = 0x0A;
/// Zero the checksum failure counter. Code must equal the address.
pub const CLEAR_CHECKSUM_FAILURES: u8 = 0x0B;

/// Least significant byte of a new instrument time.
pub const SET_TIME_BYTE_0: u8 = 0x0C;
/// Second least significant byte of a new instrument time.
pub const SET_TIME_BYTE_1: u8 = 0x0D;
/// Second most significant byte of a new instrument time.
pub const SET_TIME_BYTE_2: u8 = 0x0E;
/// Most significant byte of a new instrument time. Starts the time set sequence.
pub const SET_TIME_BYTE_3: u8 = 0x0F;

/// Most significant byte of a code memory patch address.
pub const WRITE_CODE_MEMORY_MSB: u8 = 0x10;
/// Least significant byte of a code memory patch address.
pub const WRITE_CODE_MEMORY_LSB: u8 = 0x6F;
/// Most significant byte of a data memory write address.
pub const WRITE_DATA_MEMORY_MSB: u8 = 0x15;
/// Least significant byte of a data memory write address.
pub const WRITE_DATA_MEMORY_LSB: u8 = 0x6A;
/// Most significant byte of a data memory dump address.
pub const READ_DATA_MEMORY_MSB: u8 = 0x1F;
/// Least significant byte of a data memory dump address.
pub const READ_DATA_MEMORY_LSB: u8 = 0x60;

/// Switch sensor unit 1 on, off or into self test.
pub const SWITCH_SU_1: u8 = 0x20;
/// Switch sensor unit 2 on, off or into self test.
pub const SWITCH_SU_2: u8 = 0x30;
/// Switch sensor unit 3 on, off or into self test.
pub const SWITCH_SU_3: u8 = 0x40;
/// Switch sensor unit 4 on, off or into self test.
pub const SWITCH_SU_4: u8 = 0x50;

/// Address offset from `SWITCH_SU_n` of the plasma 1+ trigger threshold.
pub const PLASMA_1_PLUS_THRESHOLD_OFFSET: u8 = 0x01;
/// Address offset from `SWITCH_SU_n` of the plasma 1- trigger threshold.
pub const PLASMA_1_MINUS_THRESHOLD_OFFSET: u8 = 0x02;
/// Address offset from `SWITCH_SU_n` of the piezo trigger threshold.
pub const PIEZO_THRESHOLD_OFFSET: u8 = 0x03;
/// Address offset from `SWITCH_SU_n` of the first classification level.
///
/// Levels follow in the order plasma 1+, plasma 1-, piezo 1, piezo 2, plasma 2+.
pub const CLASS_LEVEL_OFFSET: u8 = 0x04;
/// Number of classification level commands per sensor unit.
pub const NUM_CLASS_LEVELS: usize = 5;
/// Last per-unit parameter address (the final classification level of unit 4).
pub const LAST_SU_PARAMETER: u8 = SWITCH_SU_4 + CLASS_LEVEL_OFFSET + NUM_CLASS_LEVELS as u8 - 1;

/// First quality coefficient.
pub const SET_COEFFICIENT_1: u8 = 0x70;
/// Last quality coefficient.
pub const SET_COEFFICIENT_5: u8 = 0x74;
/// Number of quality coefficients.
pub const NUM_QCOEFF: usize = 5;

/// Highest command address representable in a command word.
pub const MAX_TC_ADDRESS: u8 = 0x7F;

// ---------------------------------------------------------------------------
// Command codes
// ---------------------------------------------------------------------------

/// `SWITCH_SU_n` code: power the unit on.
pub const ON_VALUE: u8 = 0x55;
/// `SWITCH_SU_n` code: power the unit off.
pub const OFF_VALUE: u8 = 0x73;
/// `SWITCH_SU_n` code: run the unit self test.
pub const SELF_TEST: u8 = 0x99;

// ---------------------------------------------------------------------------
// Error status bits
// ---------------------------------------------------------------------------

/// Malformed, out-of-sequence or contextually rejected command.
pub const TC_ERROR: u8 = 0x01;
/// Command word failed the parity check.
pub const PARITY_ERROR: u8 = 0x02;
/// Memory patch checksum mismatch.
pub const MEMORY_WRITE_ERROR: u8 = 0x40;

// ---------------------------------------------------------------------------
// Mode status
// ---------------------------------------------------------------------------

/// Bits of `mode_status` holding the instrument mode.
pub const MODE_BITS_MASK: u8 = 0x03;

// ---------------------------------------------------------------------------
// Housekeeping register layout
// ---------------------------------------------------------------------------

/// Number of sensor units.
pub const NUM_SU: usize = 4;
/// Size (in bytes) of the settings of one sensor unit in the housekeeping block.
pub const SU_SETTINGS_LEN: usize = 8;

/// Offset of the error status register.
pub const ERROR_STATUS_INDEX: usize = 0;
/// Offset of the mode status register.
pub const MODE_STATUS_INDEX: usize = 1;
/// Offset of the last command word (2 bytes).
pub const TC_WORD_INDEX: usize = 2;
/// Offset of the command time tag (4 bytes).
pub const TC_TIME_TAG_INDEX: usize = 4;
/// Offset of the watchdog failure counter.
pub const WATCHDOG_FAILURES_INDEX: usize = 8;
/// Offset of the checksum failure counter.
pub const CHECKSUM_FAILURES_INDEX: usize = 9;
/// Offset of the software version.
pub const SW_VERSION_INDEX: usize = 10;
/// Offset of the mailbox overflow counter.
pub const ISR_SEND_MESSAGE_ERROR_INDEX: usize = 11;
/// Offset of the sensor unit status registers (one per unit).
pub const SU_STATUS_INDEX: usize = 12;
/// Offset of the sensor unit temperatures (two per unit).
pub const SU_TEMPERATURE_INDEX: usize = 16;
/// Offset of the DPU +5 V digital supply reading.
pub const DPU_PLUS_5_DIGITAL_INDEX: usize = 24;
/// Offset of the task send-message error counter.
pub const OS_SEND_MESSAGE_ERROR_INDEX: usize = 25;
/// Offset of the sensor unit +50 V supply reading.
pub const SU_PLUS_50_INDEX: usize = 26;
/// Offset of the sensor unit -50 V supply reading.
pub const SU_MINUS_50_INDEX: usize = 27;
/// Offset of the per-unit settings (thresholds and classification levels).
pub const SU_SETTINGS_INDEX: usize = 28;
/// Offset of the failed code address diagnostic (2 bytes).
pub const FAILED_CODE_ADDRESS_INDEX: usize = 60;
/// Offset of the failed data address diagnostic (2 bytes).
pub const FAILED_DATA_ADDRESS_INDEX: usize = 62;
/// Offset of the per-unit hit counters (2 bytes each).
pub const SU_HITS_INDEX: usize = 64;
/// Offset of the instrument time. Refreshed by the transmitter right before it is sent.
pub const TIME_INDEX: usize = 72;
/// Offset of the software error flags.
pub const SOFTWARE_ERROR_INDEX: usize = 76;
/// Offset of the hit budget exceeding counter.
pub const HIT_BUDGET_EXCEEDINGS_INDEX: usize = 77;
/// Offset of the quality coefficients.
pub const COEFFICIENT_INDEX: usize = 78;
/// Offset of the unused trailing register.
pub const HK_NOT_USED_INDEX: usize = 83;
/// Total size (in bytes) of the housekeeping block.
pub const HK_BLOCK_SIZE: usize = 84;

/// Highest starting register accepted by `SEND_STATUS_REGISTER`.
pub const LAST_EVEN_REGISTER: u8 = (HK_BLOCK_SIZE - 2) as u8;

// ---------------------------------------------------------------------------
// Science data layout
// ---------------------------------------------------------------------------

/// Number of event classes counted per sensor unit.
pub const NUM_CLASSES: usize = 10;
/// Size (in bytes) of one event record.
pub const EVENT_RECORD_SIZE: usize = 26;
/// Offset of the counter table in the science block.
pub const SCIENCE_COUNTERS_INDEX: usize = 2;
/// Offset of the unused pad byte in the science block.
pub const SCIENCE_NOT_USED_INDEX: usize = SCIENCE_COUNTERS_INDEX + NUM_SU * NUM_CLASSES;
/// Offset of the counter checksum in the science block.
pub const COUNTER_CHECKSUM_INDEX: usize = SCIENCE_NOT_USED_INDEX + 1;
/// Size (in bytes) of the science block header, before the first event record.
pub const SCIENCE_HEADER_SIZE: usize = COUNTER_CHECKSUM_INDEX + 1;

/// Number of event records the science store can hold.
pub const MAX_EVENTS: usize = 1261;
/// Number of hits that can be held back while science telemetry is being sent.
pub const MAX_QUEUE_LENGTH: usize = 10;

// ---------------------------------------------------------------------------
// Memory access
// ---------------------------------------------------------------------------

/// Size (in bytes) of one memory patch or memory dump transfer.
pub const MEMORY_BUFFER_SIZE: usize = 32;
/// First address of the data memory that can be dumped or written.
pub const DATA_MEMORY_START: u16 = 0x0000;
/// Last address of the data memory that can be dumped or written.
pub const DATA_MEMORY_END: u16 = 0x7FFF;
/// First address of the code memory that can be patched.
pub const PATCH_AREA_START: u16 = 0x1000;
/// Last address of the code memory that can be patched.
pub const PATCH_AREA_END: u16 = 0x7FFF;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Mailbox wait timeout (in milliseconds) while a multi-word command sequence is in progress.
pub const SEQUENCE_TIMEOUT_MS: u32 = 250;
/// Polling interval (in microseconds) of the blocking mailbox wait.
pub const POLL_INTERVAL_US: u32 = 1_000;
/// Number of event slots searched per critical section when looking for a slot to replace.
pub const RECORD_SEARCH_CHUNK: usize = 64;

/// Software version reported in the housekeeping block.
pub const SW_VERSION: u8 = 0x21;
