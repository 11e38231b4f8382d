//! Science event store.
//!
//! Holds the classified particle hits produced by the acquisition side until they are sent with
//! `SEND_SCIENCE_DATA_FILE`, together with the hit counters per sensor unit and class.
//!
//! ## Retention
//!
//! - While there is room, every hit gets a new slot and the high-water mark advances.
//! - Once full, the hit with the lowest quality number (oldest first on ties) is the
//!   candidate for replacement. The new hit only overwrites it if its own quality number is at
//!   least as high.
//! - While science telemetry is being sent, committed storage is frozen and hits go to a small
//!   deferred queue instead. When the queue is full, further hits of that pass are dropped. The
//!   queue is flushed into storage when the transmission completes.
//!
//! Hit counters are counted whether or not the hit itself is kept. The counter checksum is the
//! XOR of all per-(unit, class) counters and is maintained incrementally.

use core::ops::Range;

use heapless::Vec;

use crate::consts::*;
use crate::parity::xor_fold;
use crate::telemetry::TelemetrySource;

/// One classified particle hit, as produced by the acquisition side.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct EventRecord {
    /// Quality number computed by the classification.
    pub quality_number: u16,
    /// Event class, `0..NUM_CLASSES`.
    pub classification: u8,
    /// Sensor unit index, `0..NUM_SU`.
    pub su_number: u8,
    /// Instrument time of the hit.
    pub hit_time: u32,
    /// First sensor unit temperature.
    pub su_temperature_1: u8,
    /// Second sensor unit temperature.
    pub su_temperature_2: u8,
    /// Plasma 1+ peak amplitude.
    pub plasma_1_plus: u16,
    /// Plasma 1- peak amplitude.
    pub plasma_1_minus: u16,
    /// Piezo 1 peak amplitude.
    pub piezo_1: u16,
    /// Piezo 2 peak amplitude.
    pub piezo_2: u16,
    /// Plasma 2+ peak amplitude.
    pub plasma_2_plus: u16,
    /// Plasma 1+ rise time.
    pub rise_time: u8,
    /// Delay from plasma 1+ to plasma 1- trigger.
    pub delay_1: u8,
    /// Delay from plasma 1+ to plasma 2+ trigger.
    pub delay_2: u8,
    /// Delay from plasma 1+ to piezo trigger.
    pub delay_3: u16,
    /// XOR of all other record bytes.
    pub checksum: u8,
}

impl EventRecord {
    /// An all-zero record.
    pub const EMPTY: Self = Self {
        quality_number: 0,
        classification: 0,
        su_number: 0,
        hit_time: 0,
        su_temperature_1: 0,
        su_temperature_2: 0,
        plasma_1_plus: 0,
        plasma_1_minus: 0,
        piezo_1: 0,
        piezo_2: 0,
        plasma_2_plus: 0,
        rise_time: 0,
        delay_1: 0,
        delay_2: 0,
        delay_3: 0,
        checksum: 0,
    };

    /// Wire form of the record.
    pub fn to_bytes(&self) -> [u8; EVENT_RECORD_SIZE] {
        let q = self.quality_number.to_be_bytes();
        let t = self.hit_time.to_be_bytes();
        let p1p = self.plasma_1_plus.to_be_bytes();
        let p1m = self.plasma_1_minus.to_be_bytes();
        let z1 = self.piezo_1.to_be_bytes();
        let z2 = self.piezo_2.to_be_bytes();
        let p2p = self.plasma_2_plus.to_be_bytes();
        let d3 = self.delay_3.to_be_bytes();
        [
            q[0],
            q[1],
            self.classification,
            self.su_number,
            t[0],
            t[1],
            t[2],
            t[3],
            self.su_temperature_1,
            self.su_temperature_2,
            p1p[0],
            p1p[1],
            p1m[0],
            p1m[1],
            z1[0],
            z1[1],
            z2[0],
            z2[1],
            p2p[0],
            p2p[1],
            self.rise_time,
            self.delay_1,
            self.delay_2,
            d3[0],
            d3[1],
            self.checksum,
        ]
    }

    /// XOR of every byte except the checksum itself.
    pub fn compute_checksum(&self) -> u8 {
        xor_fold(&self.to_bytes()[..EVENT_RECORD_SIZE - 1])
    }

    /// Stores [`compute_checksum`](Self::compute_checksum) in the record.
    pub fn seal(&mut self) {
        self.checksum = self.compute_checksum();
    }

    /// Whether the stored checksum matches the record contents.
    pub fn checksum_ok(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    fn rank(&self) -> (u16, u32) {
        (self.quality_number, self.hit_time)
    }
}

impl TelemetrySource for EventRecord {
    fn byte_at(&self, index: usize) -> u8 {
        self.to_bytes().get(index).copied().unwrap_or(0)
    }
}

/// Where a committed hit goes.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Slot {
    /// A never-used slot just above the high-water mark.
    Free,
    /// An occupied slot holding the weakest hit.
    Replace(usize),
}

/// Outcome of [`EventStore::record`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Recorded {
    /// The hit was written into this slot.
    Stored(usize),
    /// The weakest slot held a better hit and was kept; the new hit was only counted.
    Kept(usize),
    /// The hit was queued until the current science transmission completes.
    Deferred,
    /// The deferred queue was full and the hit was dropped.
    Dropped,
}

/// Bounded science store with `N` event slots and a deferred queue of `Q` hits.
#[derive(Clone, Debug)]
pub struct EventStore<const N: usize, const Q: usize> {
    length: u16,
    event_counter: [[u8; NUM_CLASSES]; NUM_SU],
    not_used: u8,
    counter_checksum: u8,
    events: Vec<EventRecord, N>,
    queue: [EventRecord; Q],
    queue_len: usize,
    dropped_hits: u16,
    generation: u16,
}

/// The store with the instrument capacities.
pub type ScienceStore = EventStore<MAX_EVENTS, MAX_QUEUE_LENGTH>;

impl<const N: usize, const Q: usize> Default for EventStore<N, Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const Q: usize> EventStore<N, Q> {
    const CAPACITY_OK: () = assert!(N > 0 && Q > 0, "store and queue need at least one slot");

    /// Creates an empty store.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_OK;
        Self {
            length: 0,
            event_counter: [[0; NUM_CLASSES]; NUM_SU],
            not_used: 0,
            counter_checksum: 0,
            events: Vec::new(),
            queue: [EventRecord::EMPTY; Q],
            queue_len: 0,
            dropped_hits: 0,
            generation: 0,
        }
    }

    /// Drops every committed and queued event and zeroes the counters.
    pub fn clear(&mut self) {
        self.length = 0;
        self.event_counter = [[0; NUM_CLASSES]; NUM_SU];
        self.not_used = 0;
        self.counter_checksum = 0;
        self.events.clear();
        self.queue_len = 0;
        self.dropped_hits = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Number of committed hits (the high-water mark).
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no hit is committed.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether every slot is committed.
    pub fn is_full(&self) -> bool {
        self.events.is_full()
    }

    /// Committed hits, in slot order.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Hits waiting for the current science transmission to finish.
    pub fn queued(&self) -> &[EventRecord] {
        &self.queue[..self.queue_len]
    }

    /// Per-(unit, class) hit counter.
    pub fn counter(&self, unit: usize, class: usize) -> u8 {
        self.event_counter
            .get(unit)
            .and_then(|row| row.get(class))
            .copied()
            .unwrap_or(0)
    }

    /// Incrementally maintained XOR of all per-(unit, class) counters.
    pub fn counter_checksum(&self) -> u8 {
        self.counter_checksum
    }

    /// Hits lost because the deferred queue was full.
    pub fn dropped_hits(&self) -> u16 {
        self.dropped_hits
    }

    /// Changes whenever committed storage is written.
    pub fn generation(&self) -> u16 {
        self.generation
    }

    /// Records a hit.
    ///
    /// # Arguments
    /// - `event`: The classified hit
    /// - `transmitting`: Whether science telemetry is currently being sent
    /// - `su_hits`: The per-unit hit counters of the housekeeping block
    ///
    /// # Notes
    /// The counters incremented when a hit is committed are those of the queue head entry. The
    /// hit is staged at the queue tail first, and outside a science transmission the queue is
    /// empty, so the head is the new hit itself.
    pub fn record(
        &mut self,
        event: &EventRecord,
        transmitting: bool,
        su_hits: &mut [u16; NUM_SU],
    ) -> Recorded {
        if transmitting {
            return self.defer(event);
        }
        match self.choose_slot() {
            Some(slot) => self.commit(event, slot, su_hits),
            None => Recorded::Dropped,
        }
    }

    /// Appends a hit to the deferred queue, or drops it when the queue is full.
    pub fn defer(&mut self, event: &EventRecord) -> Recorded {
        if self.queue_len >= Q {
            self.dropped_hits = self.dropped_hits.saturating_add(1);
            trace!("deferred queue full, hit dropped");
            return Recorded::Dropped;
        }
        self.queue[self.queue_len] = *event;
        self.queue_len += 1;
        Recorded::Deferred
    }

    /// Picks the slot a new hit would go to.
    pub fn choose_slot(&self) -> Option<Slot> {
        if self.is_full() {
            self.weakest_in(0..self.events.len()).map(Slot::Replace)
        } else {
            Some(Slot::Free)
        }
    }

    /// Index of the lowest-quality hit in `range`, oldest first on ties.
    pub fn weakest_in(&self, range: Range<usize>) -> Option<usize> {
        let end = range.end.min(self.events.len());
        let start = range.start.min(end);
        self.events[start..end]
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.rank())
            .map(|(i, _)| start + i)
    }

    /// Quality number and hit time of a committed slot.
    pub fn rank_of(&self, slot: usize) -> Option<(u16, u32)> {
        self.events.get(slot).map(EventRecord::rank)
    }

    /// Writes a hit into an already chosen slot.
    ///
    /// Counters are incremented for the queue head entry (see [`record`](Self::record)); the
    /// slot is only overwritten if the new quality number does not regress.
    pub fn commit(
        &mut self,
        event: &EventRecord,
        slot: Slot,
        su_hits: &mut [u16; NUM_SU],
    ) -> Recorded {
        if self.queue_len < Q {
            self.queue[self.queue_len] = *event;
        }
        let head = self.queue[0];
        self.increment_counters(
            head.su_number as usize,
            head.classification as usize,
            su_hits,
        );
        self.place(event, slot)
    }

    fn place(&mut self, event: &EventRecord, slot: Slot) -> Recorded {
        match slot {
            Slot::Free => match self.events.push(*event) {
                Ok(()) => {
                    self.generation = self.generation.wrapping_add(1);
                    Recorded::Stored(self.events.len() - 1)
                }
                Err(_) => Recorded::Dropped,
            },
            Slot::Replace(i) => match self.events.get_mut(i) {
                Some(old) if event.quality_number >= old.quality_number => {
                    *old = *event;
                    self.generation = self.generation.wrapping_add(1);
                    Recorded::Stored(i)
                }
                Some(_) => Recorded::Kept(i),
                None => Recorded::Dropped,
            },
        }
    }

    /// Counts one hit of `class` on sensor unit `unit`.
    ///
    /// Both counters saturate. Out-of-range indices leave the corresponding counter untouched.
    pub fn increment_counters(&mut self, unit: usize, class: usize, su_hits: &mut [u16; NUM_SU]) {
        if let Some(hits) = su_hits.get_mut(unit) {
            *hits = hits.saturating_add(1);
        }
        if let Some(counter) = self
            .event_counter
            .get_mut(unit)
            .and_then(|row| row.get_mut(class))
        {
            let old = *counter;
            let new = old.saturating_add(1);
            *counter = new;
            self.counter_checksum ^= old ^ new;
        }
    }

    /// Moves the deferred queue into committed storage.
    ///
    /// Called when a science transmission completes. The high-water mark ends at the post-flush
    /// slot count; the counter checksum carries on from its accumulated value.
    pub fn flush(&mut self, su_hits: &mut [u16; NUM_SU]) {
        let queued = self.queue_len;
        for i in 0..queued {
            let event = self.queue[i];
            if let Some(slot) = self.choose_slot() {
                let _ = self.place(&event, slot);
            }
            self.increment_counters(
                event.su_number as usize,
                event.classification as usize,
                su_hits,
            );
        }
        self.queue_len = 0;
        self.not_used = 0;
        debug!("flushed {} deferred hits, {} stored", queued, self.events.len());
    }

    /// Number of bytes a science transmission sends right now.
    pub fn downlink_len(&self) -> usize {
        SCIENCE_HEADER_SIZE + self.events.len() * EVENT_RECORD_SIZE
    }

    /// Writes the length field ahead of a science transmission and returns the end index.
    pub fn prepare_downlink(&mut self) -> usize {
        let end = self.downlink_len();
        self.length = end as u16;
        end
    }
}

impl<const N: usize, const Q: usize> TelemetrySource for EventStore<N, Q> {
    fn byte_at(&self, index: usize) -> u8 {
        match index {
            0..SCIENCE_COUNTERS_INDEX => self.length.to_be_bytes()[index],
            SCIENCE_COUNTERS_INDEX..SCIENCE_NOT_USED_INDEX => {
                let i = index - SCIENCE_COUNTERS_INDEX;
                self.event_counter[i / NUM_CLASSES][i % NUM_CLASSES]
            }
            SCIENCE_NOT_USED_INDEX => self.not_used,
            COUNTER_CHECKSUM_INDEX => self.counter_checksum,
            _ => {
                let i = index - SCIENCE_HEADER_SIZE;
                self.events
                    .get(i / EVENT_RECORD_SIZE)
                    .map(|e| e.byte_at(i % EVENT_RECORD_SIZE))
                    .unwrap_or(0)
            }
        }
    }
}
