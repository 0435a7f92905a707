//! Immutable, timestamp-ordered frame index and nearest-frame queries.

use std::cmp::Ordering;

use crate::{FieldChannel, FrameRecord, Result, TieBreak, TimelineError};

/// Frame records sorted by timestamp, built once and never mutated.
///
/// Always holds at least one record.
#[derive(Debug, Clone)]
pub struct TimelineIndex {
    records: Vec<FrameRecord>,
    tie_break: TieBreak,
}

impl TimelineIndex {
    /// Build an index with the default tie-break policy.
    pub fn build(records: Vec<FrameRecord>) -> Result<Self> {
        Self::build_with(records, TieBreak::default())
    }

    /// Sort `records` by timestamp and build an index.
    ///
    /// The sort is stable. When several records share a timestamp, the last one in
    /// stable order is kept and the others are dropped.
    pub fn build_with(mut records: Vec<FrameRecord>, tie_break: TieBreak) -> Result<Self> {
        if records.is_empty() {
            return Err(TimelineError::EmptyDataset);
        }

        records.sort_by_key(|record| record.timestamp);

        let before = records.len();
        records.dedup_by(|later, kept| {
            if later.timestamp == kept.timestamp {
                std::mem::swap(later, kept);
                true
            } else {
                false
            }
        });
        let dropped = before - records.len();
        if dropped > 0 {
            tracing::warn!(
                target: "dvtimeline::timeline",
                dropped,
                "duplicate timestamps collapsed; last record in source order kept"
            );
        }

        tracing::debug!(
            target: "dvtimeline::timeline",
            frames = records.len(),
            first = records[0].timestamp,
            last = records[records.len() - 1].timestamp,
            "timeline index built"
        );

        Ok(Self { records, tie_break })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn first(&self) -> &FrameRecord {
        &self.records[0]
    }

    #[must_use]
    pub fn last(&self) -> &FrameRecord {
        &self.records[self.records.len() - 1]
    }

    #[must_use]
    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    #[must_use]
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Distance between the first and last timestamps.
    #[must_use]
    pub fn span(&self) -> u64 {
        self.last().timestamp.abs_diff(self.first().timestamp)
    }

    /// The record whose timestamp is closest to `query`.
    ///
    /// Queries at or before the first record resolve to the first record, queries at or
    /// after the last resolve to the last, however far outside the range they are.
    #[must_use]
    pub fn nearest_frame(&self, query: i64) -> &FrameRecord {
        let first = self.first();
        if query <= first.timestamp {
            return first;
        }
        let last = self.last();
        if query >= last.timestamp {
            return last;
        }

        // Clamping above guarantees 1 <= i <= len - 1.
        let i = self.records.partition_point(|record| record.timestamp < query);
        let before = &self.records[i - 1];
        let after = &self.records[i];

        let to_before = query.abs_diff(before.timestamp);
        let to_after = after.timestamp.abs_diff(query);
        match to_before.cmp(&to_after) {
            Ordering::Less => before,
            Ordering::Greater => after,
            Ordering::Equal => match self.tie_break {
                TieBreak::Later => after,
                TieBreak::Earlier => before,
            },
        }
    }

    /// Field value of `record` selected by an integer channel (`0` odd, `1` even).
    pub fn value_at(record: &FrameRecord, channel: i32) -> Result<f32> {
        Ok(record.field_value(FieldChannel::try_from(channel)?))
    }

    /// Records with `start <= timestamp <= end`, in timestamp order.
    #[must_use]
    pub fn window(&self, start: i64, end: i64) -> &[FrameRecord] {
        if start > end {
            return &[];
        }
        let lo = self.records.partition_point(|record| record.timestamp < start);
        let hi = self.records.partition_point(|record| record.timestamp <= end);
        &self.records[lo..hi]
    }

    /// Position of the record with `frame_number`, if present.
    #[must_use]
    pub fn position_of(&self, frame_number: u64) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.frame_number == frame_number)
    }
}
