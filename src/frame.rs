use std::time::Duration;

use crate::digit::Digit;

/// Number of bits shown by the clock.
pub const SLOT_COUNT: usize = 4;
/// The counter wraps after this many seconds.
pub const COUNTER_PERIOD: u64 = 1 << SLOT_COUNT;

/// Horizontal offset of each slot, indexed by bit position. Bit 3 sits at `1.85`, bit 0 at `-1.85`.
pub const SLOT_OFFSETS: [f32; SLOT_COUNT] = [-1.85, -1.85 / 3.0, 1.85 / 3.0, 1.85];

/// One digit to draw this frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Slot {
    /// Bit position, also the index into [`SLOT_OFFSETS`].
    pub bit: usize,
    pub digit: Digit,
    pub x_offset: f32,
}

/// Whole seconds of `elapsed` reduced to the 4-bit counter.
pub fn counter_from_elapsed(elapsed: Duration) -> u8 {
    (elapsed.as_secs() % COUNTER_PERIOD) as u8
}

/// Splits `counter` into the four slots drawn this frame, least significant bit first.
pub fn frame_slots(counter: u8) -> [Slot; SLOT_COUNT] {
    std::array::from_fn(|bit| Slot {
        bit,
        digit: Digit::from_bit(counter, bit),
        x_offset: SLOT_OFFSETS[bit],
    })
}
