//! Streaming parser for dvrescue XML analysis reports.
//!
//! The report lists every analysed frame of a capture:
//! - `<media>` wraps one analysed file (only the first one is ingested)
//! - `<frames>` wraps a run of frames sharing stream properties
//! - `<frame n=".." pts="..">` is one frame; nested `<sta n=".." n_even=".."/>`
//!   elements count error-concealed video blocks, split by field
//!
//! Events are pulled one at a time with a reused buffer so reports covering
//! hours of capture never exist as a document tree in memory.

use std::io::BufRead;

use quick_xml::Reader as XmlReader;
use quick_xml::events::{BytesStart, Event};

use super::ReportParser;
use crate::constants::{
    ATTR_FRAME_NUMBER, ATTR_PTS, ATTR_STA_COUNT, ATTR_STA_EVEN_COUNT, ELEMENT_FRAME,
    ELEMENT_FRAMES, ELEMENT_MEDIA, ELEMENT_STA,
};
use crate::{FrameRecord, ParseOptions, Result, TimelineError, TimestampSource};

/// Parser for the dvrescue XML report format.
#[derive(Debug, Clone, Default)]
pub struct DvRescueXmlParser {
    options: ParseOptions,
}

impl DvRescueXmlParser {
    #[must_use]
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }
}

impl ReportParser for DvRescueXmlParser {
    fn name(&self) -> &'static str {
        "dvrescue-xml"
    }

    fn parse(&self, source: &mut dyn BufRead) -> Result<Vec<FrameRecord>> {
        let mut reader = XmlReader::from_reader(source);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut state = ParseState::new(&self.options);

        loop {
            let position = reader.buffer_position();
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(err) => {
                    return Err(TimelineError::parse(format!(
                        "malformed XML near byte {}: {err}",
                        reader.buffer_position()
                    )));
                }
            };
            match event {
                Event::Start(ref e) => state.open(e, false, position)?,
                Event::Empty(ref e) => state.open(e, true, position)?,
                Event::End(ref e) => state.close(e.local_name().as_ref(), position)?,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        state.finish()
    }
}

/// Frame whose closing tag has not been seen yet.
struct PendingFrame {
    frame_number: u64,
    timestamp: i64,
    odd_count: u64,
    even_count: u64,
}

impl PendingFrame {
    fn into_record(self) -> FrameRecord {
        FrameRecord::new(
            self.frame_number,
            self.timestamp,
            self.odd_count as f32,
            self.even_count as f32,
        )
    }
}

struct ParseState<'a> {
    options: &'a ParseOptions,
    depth: usize,
    saw_root: bool,
    media_seen: usize,
    in_extra_media: bool,
    open_frames_blocks: usize,
    current: Option<PendingFrame>,
    records: Vec<FrameRecord>,
}

impl<'a> ParseState<'a> {
    fn new(options: &'a ParseOptions) -> Self {
        Self {
            options,
            depth: 0,
            saw_root: false,
            media_seen: 0,
            in_extra_media: false,
            open_frames_blocks: 0,
            current: None,
            records: Vec::new(),
        }
    }

    fn open(&mut self, element: &BytesStart<'_>, empty: bool, position: usize) -> Result<()> {
        if self.depth == 0 {
            if self.saw_root {
                return Err(TimelineError::parse(format!(
                    "second root element near byte {position}"
                )));
            }
            self.saw_root = true;
        }
        if !empty {
            self.depth += 1;
        }

        let name = element.local_name();
        let name = name.as_ref();

        if name == ELEMENT_MEDIA {
            self.media_seen += 1;
            if self.media_seen > 1 {
                if self.media_seen == 2 {
                    log::warn!(
                        "report describes more than one media file; ingesting only the first"
                    );
                }
                self.in_extra_media = !empty;
            }
            return Ok(());
        }
        if self.in_extra_media {
            return Ok(());
        }

        match name {
            n if n == ELEMENT_FRAMES => {
                if !empty {
                    self.open_frames_blocks += 1;
                }
            }
            n if n == ELEMENT_FRAME && self.open_frames_blocks > 0 => {
                if self.current.is_some() {
                    return Err(TimelineError::parse(format!(
                        "frame nested inside another frame near byte {position}"
                    )));
                }
                let pending = self.frame_from(element, position)?;
                if empty {
                    self.records.push(pending.into_record());
                } else {
                    self.current = Some(pending);
                }
            }
            n if n == ELEMENT_STA => {
                if let Some(frame) = self.current.as_mut() {
                    let (odd, even) = field_counts(element, position)?;
                    frame.odd_count = frame.odd_count.saturating_add(odd);
                    frame.even_count = frame.even_count.saturating_add(even);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8], position: usize) -> Result<()> {
        self.depth = self.depth.checked_sub(1).ok_or_else(|| {
            TimelineError::parse(format!("unexpected closing tag near byte {position}"))
        })?;

        if name == ELEMENT_MEDIA {
            self.in_extra_media = false;
            return Ok(());
        }
        if self.in_extra_media {
            return Ok(());
        }

        if name == ELEMENT_FRAMES {
            self.open_frames_blocks = self.open_frames_blocks.saturating_sub(1);
        } else if name == ELEMENT_FRAME {
            if let Some(frame) = self.current.take() {
                self.records.push(frame.into_record());
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Vec<FrameRecord>> {
        if !self.saw_root {
            return Err(TimelineError::parse("document has no root element"));
        }
        if self.depth != 0 {
            return Err(TimelineError::parse(format!(
                "unexpected end of document with {} unclosed element(s)",
                self.depth
            )));
        }
        log::debug!("parsed {} frame record(s)", self.records.len());
        Ok(self.records)
    }

    fn frame_from(&self, element: &BytesStart<'_>, position: usize) -> Result<PendingFrame> {
        let frame_number: u64 = parse_number(
            required_attribute(element, ATTR_FRAME_NUMBER, "frame", position)?.as_str(),
            "frame number",
            position,
        )?;
        let timestamp = match self.options.timestamp_source {
            TimestampSource::FrameNumber => i64::try_from(frame_number).map_err(|_| {
                TimelineError::parse(format!(
                    "frame number {frame_number} near byte {position} exceeds the timeline range"
                ))
            })?,
            TimestampSource::Pts => {
                let pts = required_attribute(element, ATTR_PTS, "frame", position)?;
                parse_pts_micros(&pts).ok_or_else(|| {
                    TimelineError::parse(format!(
                        "invalid pts {pts:?} on frame {frame_number} near byte {position}"
                    ))
                })?
            }
        };
        Ok(PendingFrame {
            frame_number,
            timestamp,
            odd_count: 0,
            even_count: 0,
        })
    }
}

/// Split a `sta` element's error count into `(odd, even)` field shares.
fn field_counts(element: &BytesStart<'_>, position: usize) -> Result<(u64, u64)> {
    let total: u64 = parse_number(
        required_attribute(element, ATTR_STA_COUNT, "sta", position)?.as_str(),
        "sta count",
        position,
    )?;
    let even: u64 = match attribute(element, ATTR_STA_EVEN_COUNT, position)? {
        Some(value) => parse_number(&value, "sta even count", position)?,
        None => 0,
    };
    if even > total {
        return Err(TimelineError::parse(format!(
            "sta near byte {position} has n_even={even} greater than n={total}"
        )));
    }
    Ok((total - even, even))
}

fn attribute(element: &BytesStart<'_>, key: &[u8], position: usize) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|err| {
            TimelineError::parse(format!("malformed attribute near byte {position}: {err}"))
        })?;
        if attr.key.local_name().as_ref() == key {
            let value = attr.unescape_value().map_err(|err| {
                TimelineError::parse(format!(
                    "undecodable attribute value near byte {position}: {err}"
                ))
            })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required_attribute(
    element: &BytesStart<'_>,
    key: &[u8],
    element_name: &str,
    position: usize,
) -> Result<String> {
    attribute(element, key, position)?.ok_or_else(|| {
        TimelineError::parse(format!(
            "{element_name} near byte {position} is missing required attribute `{}`",
            String::from_utf8_lossy(key)
        ))
    })
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str, position: usize) -> Result<T> {
    let Ok(number) = value.trim().parse::<T>() else {
        return Err(TimelineError::parse(format!(
            "invalid {what} {value:?} near byte {position}"
        )));
    };
    Ok(number)
}

/// Convert a `[[HH:]MM:]SS[.ffffff]` presentation timestamp into microseconds.
///
/// Fractions beyond microsecond precision are truncated.
#[must_use]
pub fn parse_pts_micros(text: &str) -> Option<i64> {
    let text = text.trim();
    let (clock, fraction) = text.split_once('.').unwrap_or((text, ""));

    let mut seconds: i64 = 0;
    for (index, part) in clock.split(':').enumerate() {
        if index > 2 || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: i64 = part.parse().ok()?;
        if index > 0 && value >= 60 {
            return None;
        }
        seconds = seconds.checked_mul(60)?.checked_add(value)?;
    }

    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut micros: i64 = 0;
    for position in 0..6 {
        let digit = fraction
            .as_bytes()
            .get(position)
            .map_or(0, |b| i64::from(b - b'0'));
        micros = micros * 10 + digit;
    }

    seconds.checked_mul(1_000_000)?.checked_add(micros)
}
