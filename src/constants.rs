//! Element names and defaults shared across the crate.

/// Element wrapping one analysed media file.
pub const ELEMENT_MEDIA: &[u8] = b"media";
/// Element wrapping a run of frames with common stream properties.
pub const ELEMENT_FRAMES: &[u8] = b"frames";
/// One decoded frame.
pub const ELEMENT_FRAME: &[u8] = b"frame";
/// Video error statistics attached to a frame (or one of its DIF sequences).
pub const ELEMENT_STA: &[u8] = b"sta";

pub const ATTR_FRAME_NUMBER: &[u8] = b"n";
pub const ATTR_PTS: &[u8] = b"pts";
pub const ATTR_STA_COUNT: &[u8] = b"n";
pub const ATTR_STA_EVEN_COUNT: &[u8] = b"n_even";

/// Channel selector for the odd field value.
pub const CHANNEL_ODD: i32 = 0;
/// Channel selector for the even field value.
pub const CHANNEL_EVEN: i32 = 1;

pub const DEFAULT_THREAD_NAME_PREFIX: &str = "dvtimeline-populate";

/// NTSC DV frame rate, the tick rate of a frame-number timeline.
pub const NTSC_FRAME_RATE: f64 = 30_000.0 / 1_001.0;

/// Ticks per second of a timeline keyed on presentation timestamps.
pub const PTS_TICKS_PER_SECOND: f64 = 1_000_000.0;
