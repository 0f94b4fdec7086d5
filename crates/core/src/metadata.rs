use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// EXIF date tags consulted for a capture time, in priority order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimestampTag {
    DateTimeOriginal,
    DateTimeDigitized,
    DateTime,
}

impl TimestampTag {
    pub const PRIORITY: [TimestampTag; 3] = [
        TimestampTag::DateTimeOriginal,
        TimestampTag::DateTimeDigitized,
        TimestampTag::DateTime,
    ];

    pub(crate) fn exif_tag(self) -> exif::Tag {
        match self {
            TimestampTag::DateTimeOriginal => exif::Tag::DateTimeOriginal,
            TimestampTag::DateTimeDigitized => exif::Tag::DateTimeDigitized,
            TimestampTag::DateTime => exif::Tag::DateTime,
        }
    }
}

/// Shifts a capture time by a signed, possibly fractional, number of
/// minutes. `None` when the shift is not finite or leaves chrono's range.
pub fn apply_delta(timestamp: NaiveDateTime, delta_minutes: f64) -> Option<NaiveDateTime> {
    if delta_minutes == 0.0 {
        return Some(timestamp);
    }
    let millis = (delta_minutes * 60_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let delta = Duration::try_milliseconds(millis as i64)?;
    timestamp.checked_add_signed(delta)
}
