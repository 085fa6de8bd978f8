use qlog_models::EventRecord;
use thiserror::Error;

/// Why a line that looked like a record could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("missing ':' between identifier and payload")]
    MissingSeparator,
    #[error("invalid request id {0:?}")]
    InvalidId(String),
    #[error("invalid worker tag {0:?}")]
    InvalidWorkerTag(String),
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: &'static str, found: usize },
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("negative value {0:?}")]
    NegativeValue(String),
    #[error("timestamps are not in lifecycle order")]
    LifecycleOrder,
    #[error("queue snapshot is not a bracketed list")]
    MalformedSnapshot,
    #[error("worker tag followed by something other than a request record: {0:?}")]
    UnexpectedTagPayload(String),
}

/// A malformed log line, with its 1-based line number and raw content.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("malformed line {line}: {kind}: {content:?}")]
pub struct ParseError {
    pub line: usize,
    pub content: String,
    #[source]
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, content: &str, kind: ParseErrorKind) -> Self {
        Self {
            line,
            content: content.to_string(),
            kind,
        }
    }
}

/// A request record found before the first worker tag of a tagged log.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("record at position {position} appears before any worker tag: {record:?}")]
pub struct UngroupedRecordError {
    /// index of the record in the parsed sequence
    pub position: usize,
    pub record: EventRecord,
}
