//! Exporters rendering a built timeline into external formats.

mod webvtt;

pub use webvtt::{WebVttOptions, write_webvtt};
