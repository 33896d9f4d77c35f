//! One time stamp of the sparse parameter timeline.
//!
//! Channel layout:
//! ```text
//!  0..16   primary parameters (0 is the pitch channel)
//! 16..32   special transition offsets, added to the matching primary channel
//! 32       intonation contour value in semitones
//! 33..36   intonation slope, curvature and third derivative terms
//! ```

use crate::model::Parameter;

pub const NUM_CHANNELS: usize = 36;
pub const SPECIAL_OFFSET: usize = Parameter::COUNT;
pub const INTONATION: usize = 32;
pub const INTONATION_SLOPE: usize = 33;
pub const INTONATION_CURVE: usize = 34;
pub const INTONATION_CUBIC: usize = 35;

/// Time grid of the timeline in milliseconds.
pub const TIME_QUANTUM: i32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub time: i32,
    /// timing marker written by the rule pass rather than a parameter write
    pub flag: bool,
    values: [Option<f64>; NUM_CHANNELS],
}

impl Event {
    pub fn new(time: i32) -> Self {
        Event {
            time,
            flag: false,
            values: [None; NUM_CHANNELS],
        }
    }

    pub fn value(&self, channel: usize) -> Option<f64> {
        self.values[channel]
    }

    pub fn set_value(&mut self, channel: usize, value: f64) {
        self.values[channel] = Some(value);
    }

    /// `true` when no channel carries a value.
    pub fn is_marker(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// Rounds `time` down onto the timeline grid.
pub(crate) fn quantize(time: i32) -> i32 {
    (time >> 2) << 2
}
