//! Public types exposed by the `dvtimeline-core` crate.

pub mod frame;
pub mod options;

pub use frame::{FieldChannel, FrameRecord, VideoInfo};
pub use options::{
    ParseOptions, PopulateOptions, PopulateOptionsBuilder, TieBreak, TimestampSource,
};
