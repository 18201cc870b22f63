//! Heart Rate Measurement payload decoding.
//!
//! Only the flags byte and the heart rate field are read. Sensor contact,
//! energy expended and RR-interval data are left untouched.

use std::fmt;
use std::ops::RangeInclusive;

/// Flags bit 0: heart rate value is a 16-bit little-endian field.
const VALUE_FORMAT_U16: u8 = 0b0000_0001;

/// Heart rates outside this range are treated as sensor noise.
pub const VALID_BPM: RangeInclusive<u16> = 40..=240;

/// A heart rate in beats per minute that passed range validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeartRateSample(u16);

impl HeartRateSample {
    pub fn new(bpm: u16) -> Option<Self> {
        VALID_BPM.contains(&bpm).then(|| Self(bpm))
    }

    #[inline]
    pub fn bpm(self) -> u16 {
        self.0
    }
}

impl fmt::Display for HeartRateSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decode a Heart Rate Measurement notification.
///
/// If the flags announce a 16-bit value but the payload only carries one byte
/// of it, that byte is used on its own.
pub fn decode(data: &[u8]) -> Option<HeartRateSample> {
    let (&flags, value) = data.split_first()?;

    let bpm = match value {
        [low, high, ..] if flags & VALUE_FORMAT_U16 != 0 => u16::from_le_bytes([*low, *high]),
        [low, ..] => u16::from(*low),
        [] => return None,
    };

    HeartRateSample::new(bpm)
}
