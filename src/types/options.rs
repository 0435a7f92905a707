//! Options controlling how reports are parsed and how the timeline resolves queries.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_THREAD_NAME_PREFIX;
use crate::error::{Result, TimelineError};

fn default_thread_name_prefix() -> String {
    DEFAULT_THREAD_NAME_PREFIX.to_string()
}

/// Which frame attribute becomes the timeline key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    /// Key frames on their frame number (`n`). This is the axis the inspection view scrubs along.
    #[default]
    FrameNumber,
    /// Key frames on their presentation timestamp (`pts`), in microseconds.
    Pts,
}

/// Winner of a nearest-frame query that is exactly equidistant from two frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Prefer the frame with the higher timestamp.
    #[default]
    Later,
    /// Prefer the frame with the lower timestamp.
    Earlier,
}

/// Options for the report parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    #[serde(default)]
    pub timestamp_source: TimestampSource,
}

/// Options applied to every population started by a [`crate::DataModel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulateOptions {
    #[serde(default)]
    pub parse: ParseOptions,
    #[serde(default)]
    pub tie_break: TieBreak,
    /// Worker threads are named `<prefix>-<generation>`.
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
}

impl Default for PopulateOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            tie_break: TieBreak::default(),
            thread_name_prefix: default_thread_name_prefix(),
        }
    }
}

impl PopulateOptions {
    /// Start a fluent builder for `PopulateOptions`.
    #[must_use]
    pub fn builder() -> PopulateOptionsBuilder {
        PopulateOptionsBuilder::default()
    }

    /// Decode options from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        match serde_json::from_str::<Self>(json) {
            Ok(options) => options.validate().map(|()| options),
            Err(err) => Err(TimelineError::Config {
                reason: format!("failed to decode populate options: {err}").into(),
            }),
        }
    }

    /// Reject values the worker thread cannot be started with.
    pub fn validate(&self) -> Result<()> {
        if self.thread_name_prefix.contains('\0') {
            return Err(TimelineError::Config {
                reason: "thread_name_prefix must not contain NUL bytes".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PopulateOptionsBuilder {
    inner: PopulateOptions,
}

impl PopulateOptionsBuilder {
    #[must_use]
    pub fn timestamp_source(mut self, source: TimestampSource) -> Self {
        self.inner.parse.timestamp_source = source;
        self
    }

    #[must_use]
    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.inner.tie_break = tie_break;
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.inner.thread_name_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn build(self) -> PopulateOptions {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let options = PopulateOptions::from_json_str("{}").unwrap();
        assert_eq!(options, PopulateOptions::default());
        assert_eq!(options.thread_name_prefix, DEFAULT_THREAD_NAME_PREFIX);
    }

    #[test]
    fn json_overrides_selected_fields() {
        let options = PopulateOptions::from_json_str(
            r#"{"parse": {"timestamp_source": "pts"}, "tie_break": "earlier"}"#,
        )
        .unwrap();
        assert_eq!(options.parse.timestamp_source, TimestampSource::Pts);
        assert_eq!(options.tie_break, TieBreak::Earlier);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = PopulateOptions::from_json_str(r#"{"tie_break": "sideways"}"#).unwrap_err();
        assert!(matches!(err, TimelineError::Config { .. }), "{err:?}");
    }

    #[test]
    fn nul_in_thread_name_prefix_is_a_config_error() {
        let err = PopulateOptions::from_json_str(r#"{"thread_name_prefix": "scrub\u0000x"}"#)
            .unwrap_err();
        assert!(matches!(err, TimelineError::Config { .. }), "{err:?}");

        let built = PopulateOptions::builder()
            .thread_name_prefix("a\0b")
            .build();
        assert!(matches!(
            built.validate(),
            Err(TimelineError::Config { .. })
        ));
    }

    #[test]
    fn builder_sets_fields() {
        let options = PopulateOptions::builder()
            .timestamp_source(TimestampSource::Pts)
            .tie_break(TieBreak::Earlier)
            .thread_name_prefix("scrub")
            .build();
        assert_eq!(options.parse.timestamp_source, TimestampSource::Pts);
        assert_eq!(options.tie_break, TieBreak::Earlier);
        assert_eq!(options.thread_name_prefix, "scrub");
    }
}
