//! Report readers: byte sources and the parser trait used by population tasks.

mod dvrescue;

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

pub use dvrescue::{DvRescueXmlParser, parse_pts_micros};

use crate::{FrameRecord, Result, TimelineError};

/// Decodes a report byte stream into frame records, in source order.
///
/// Implementations must stream the input; they never sort or deduplicate.
pub trait ReportParser: Send + Sync {
    /// Human-readable parser name used in logs.
    fn name(&self) -> &'static str;

    fn parse(&self, source: &mut dyn BufRead) -> Result<Vec<FrameRecord>>;
}

/// Where a report's bytes come from.
pub enum ReportSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Reader(Box<dyn Read + Send>),
}

impl ReportSource {
    #[must_use]
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::Reader(Box::new(reader))
    }

    /// Short description for logs; never includes report contents.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Bytes(bytes) => format!("<{} in-memory bytes>", bytes.len()),
            Self::Reader(_) => "<reader>".to_string(),
        }
    }

    /// Open the source for buffered streaming. An unreadable path is a parse failure.
    pub fn open(self) -> Result<Box<dyn BufRead + Send>> {
        match self {
            Self::Path(path) => {
                let file = File::open(&path).map_err(|err| {
                    TimelineError::parse(format!("cannot open {}: {err}", path.display()))
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            Self::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes))),
            Self::Reader(reader) => Ok(Box::new(BufReader::new(reader))),
        }
    }
}

impl fmt::Debug for ReportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReportSource")
            .field(&self.describe())
            .finish()
    }
}

impl From<PathBuf> for ReportSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ReportSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ReportSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for ReportSource {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<String> for ReportSource {
    fn from(text: String) -> Self {
        Self::Bytes(text.into_bytes())
    }
}
