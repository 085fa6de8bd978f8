use std::fmt::Display;

use qlog_models::EventRecord;
use serde_derive::Deserialize;

use crate::error::ParseError;

/// What to do when a line cannot be parsed.
#[derive(Deserialize, Debug, Clone, Copy, Default, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Skip the line and tally it in the [`ParseSummary`].
    #[default]
    Skip,
    /// Stop at the first malformed line.
    Abort,
}

/// Tally of one pass over a log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseSummary {
    pub lines: usize,
    /// records produced; an inline `T<k> R<n>:...` line produces two
    pub records: usize,
    /// blank lines and simulator chatter
    pub ignored: usize,
    pub malformed: Vec<ParseError>,
}

impl ParseSummary {
    pub fn malformed_count(&self) -> usize {
        self.malformed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty()
    }
}

impl Display for ParseSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lines: {}, records: {}, ignored: {}, malformed: {}",
            self.lines,
            self.records,
            self.ignored,
            self.malformed_count()
        )
    }
}

/// Records of a whole log together with the parse tally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLog {
    pub records: Vec<EventRecord>,
    pub summary: ParseSummary,
}
