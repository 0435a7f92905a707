//! WebVTT cue track with one cue per frame record, for overlaying field metrics on playback.

use std::io::Write;

use crate::constants::NTSC_FRAME_RATE;
use crate::{Result, TimelineIndex};

/// Timebase used to turn timeline ticks into cue times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebVttOptions {
    /// Timeline ticks per second: the frame rate for frame-number timelines,
    /// [`crate::PTS_TICKS_PER_SECOND`] for pts timelines.
    pub ticks_per_second: f64,
}

impl Default for WebVttOptions {
    fn default() -> Self {
        Self {
            ticks_per_second: NTSC_FRAME_RATE,
        }
    }
}

/// Write `index` as a WebVTT document.
///
/// Each cue runs until the next record's timestamp; the final cue lasts one tick.
pub fn write_webvtt<W: Write>(
    index: &TimelineIndex,
    out: &mut W,
    options: &WebVttOptions,
) -> Result<()> {
    writeln!(out, "WEBVTT")?;

    let records = index.records();
    for (position, record) in records.iter().enumerate() {
        let end_tick = records
            .get(position + 1)
            .map_or(record.timestamp.saturating_add(1), |next| next.timestamp);
        writeln!(out)?;
        writeln!(
            out,
            "{} --> {}",
            cue_time(record.timestamp, options.ticks_per_second),
            cue_time(end_tick, options.ticks_per_second)
        )?;
        writeln!(
            out,
            "frame {}: odd {} even {}",
            record.frame_number, record.odd_field_value, record.even_field_value
        )?;
    }
    out.flush()?;
    Ok(())
}

/// `HH:MM:SS.mmm`, clamped at zero.
#[allow(clippy::cast_possible_truncation)]
fn cue_time(tick: i64, ticks_per_second: f64) -> String {
    let millis = ((tick as f64 / ticks_per_second) * 1000.0).round().max(0.0) as u64;
    let (hours, rest) = (millis / 3_600_000, millis % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (seconds, millis) = (rest / 1000, rest % 1000);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}
