#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::useless_vec,
        clippy::uninlined_format_args,
        clippy::cast_possible_truncation,
        clippy::float_cmp,
        clippy::cast_precision_loss
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: self-describing accessors don't need extensive docs.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Casts: error counts and tick conversions stay far below the precision limits of
// f32/f64 for any real capture (hours of video at 30 frames per second).
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
//
#![allow(clippy::manual_let_else)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::len_without_is_empty)] // a TimelineIndex is never empty

//! Ingestion of dvrescue tape digitization reports and nearest-frame lookup.
//!
//! A [`DataModel`] parses a report on a background thread into a [`TimelineIndex`] and
//! answers scrubbing queries with [`DataModel::get_video_info`].

/// The dvtimeline-core crate version (matches `Cargo.toml`).
pub const DVTIMELINE_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod constants;
pub mod error;
pub mod export;
pub mod model;
pub mod reader;
pub mod timeline;
pub mod types;

pub use constants::*;
pub use error::{Result, TimelineError};
pub use export::{WebVttOptions, write_webvtt};
pub use model::{DataModel, ModelEvent, ModelStatus, PopulationOutcome, PopulationTask};
pub use reader::{DvRescueXmlParser, ReportParser, ReportSource, parse_pts_micros};
pub use timeline::TimelineIndex;
pub use types::{
    FieldChannel, FrameRecord, ParseOptions, PopulateOptions, PopulateOptionsBuilder, TieBreak,
    TimestampSource, VideoInfo,
};
