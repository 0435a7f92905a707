//! Frame-level records produced by report ingestion.

use serde::{Deserialize, Serialize};

use crate::constants::{CHANNEL_EVEN, CHANNEL_ODD};
use crate::error::{Result, TimelineError};

/// Timing and per-field quality metrics of one decoded video frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame_number: u64,
    /// Capture time in the unit selected by [`crate::TimestampSource`].
    pub timestamp: i64,
    pub odd_field_value: f32,
    pub even_field_value: f32,
}

impl FrameRecord {
    #[must_use]
    pub fn new(
        frame_number: u64,
        timestamp: i64,
        odd_field_value: f32,
        even_field_value: f32,
    ) -> Self {
        Self {
            frame_number,
            timestamp,
            odd_field_value,
            even_field_value,
        }
    }

    /// Metric value of a single field.
    #[must_use]
    pub fn field_value(&self, channel: FieldChannel) -> f32 {
        match channel {
            FieldChannel::Odd => self.odd_field_value,
            FieldChannel::Even => self.even_field_value,
        }
    }
}

/// Interlaced field selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldChannel {
    Odd,
    Even,
}

impl TryFrom<i32> for FieldChannel {
    type Error = TimelineError;

    fn try_from(channel: i32) -> Result<Self> {
        match channel {
            CHANNEL_ODD => Ok(Self::Odd),
            CHANNEL_EVEN => Ok(Self::Even),
            _ => Err(TimelineError::InvalidChannel { channel }),
        }
    }
}

/// Answer to a scrub query: the resolved frame and both of its field values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub frame_number: u64,
    pub odd_value: f32,
    pub even_value: f32,
}

impl From<&FrameRecord> for VideoInfo {
    fn from(record: &FrameRecord) -> Self {
        Self {
            frame_number: record.frame_number,
            odd_value: record.odd_field_value,
            even_value: record.even_field_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_selector_accepts_only_two_fields() {
        assert_eq!(FieldChannel::try_from(0).unwrap(), FieldChannel::Odd);
        assert_eq!(FieldChannel::try_from(1).unwrap(), FieldChannel::Even);
        for bad in [-1, 2, i32::MAX] {
            match FieldChannel::try_from(bad) {
                Err(TimelineError::InvalidChannel { channel }) => assert_eq!(channel, bad),
                other => panic!("expected InvalidChannel for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn video_info_carries_both_fields() {
        let record = FrameRecord::new(7, 7, 1.5, 2.5);
        let info = VideoInfo::from(&record);
        assert_eq!(info.frame_number, 7);
        assert_eq!(info.odd_value, 1.5);
        assert_eq!(info.even_value, 2.5);
        assert_eq!(record.field_value(FieldChannel::Even), 2.5);
    }
}
