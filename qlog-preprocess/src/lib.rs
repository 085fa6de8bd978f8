//! Parsing and demultiplexing of queue-simulator logs.
//!
//! A log is a sequence of lines such as `R<n>:sent,length,receipt,completion`, `Q:[...]`,
//! `X<n>:sent,rejected` and worker markers `T<k>`. [`parse`] turns the lines into
//! [`qlog_models::EventRecord`]s and [`demultiplex`] splits a multi-worker log into
//! per-worker streams.

pub mod demux;
pub mod error;
pub mod line_parser;
pub mod log_parser;
pub mod models;

pub use demux::{demultiplex, WorkerStreams};
pub use error::{ParseError, ParseErrorKind, UngroupedRecordError};
pub use line_parser::{parse_line, Line};
pub use log_parser::{parse, parse_with_policy, LogParser};
pub use models::{ParsePolicy, ParseSummary, ParsedLog};
