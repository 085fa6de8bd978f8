//! Turn the lines of a simulator log into a lazy stream of [`EventRecord`]s.

use qlog_models::EventRecord;
use tracing::{debug, warn};

use crate::{
    error::ParseError,
    line_parser::{parse_line, Line},
    models::{ParsePolicy, ParseSummary, ParsedLog},
};

/// Single-pass iterator over the records of a log. Malformed lines are yielded as errors
/// and also recorded in the [`ParseSummary`], so the caller may skip them.
pub struct LogParser<I> {
    lines: I,
    line_no: usize,
    /// record of an inline `T<k> R<n>:...` line, yielded right after its tag
    pending: Option<EventRecord>,
    summary: ParseSummary,
}

impl<I, S> LogParser<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    pub fn new<L>(lines: L) -> Self
    where
        L: IntoIterator<IntoIter = I, Item = S>,
    {
        Self {
            lines: lines.into_iter(),
            line_no: 0,
            pending: None,
            summary: ParseSummary::default(),
        }
    }

    pub fn summary(&self) -> &ParseSummary {
        &self.summary
    }

    pub fn into_summary(self) -> ParseSummary {
        self.summary
    }

    fn emit(&mut self, record: EventRecord) -> Option<Result<EventRecord, ParseError>> {
        self.summary.records += 1;
        Some(Ok(record))
    }
}

impl<I, S> Iterator for LogParser<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Result<EventRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(record) = self.pending.take() {
            return self.emit(record);
        }
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            self.summary.lines += 1;
            match parse_line(self.line_no, line.as_ref()) {
                Ok(Line::Ignored) => {
                    debug!(line = self.line_no, "ignoring non-record line");
                    self.summary.ignored += 1;
                }
                Ok(Line::Tag(worker)) => return self.emit(EventRecord::WorkerTag(worker)),
                Ok(Line::Record(record)) => return self.emit(record),
                Ok(Line::TaggedRecord(worker, record)) => {
                    self.pending = Some(record);
                    return self.emit(EventRecord::WorkerTag(worker));
                }
                Err(error) => {
                    self.summary.malformed.push(error.clone());
                    return Some(Err(error));
                }
            }
        }
    }
}

/// Parse a whole log, skipping malformed lines. They are counted in the summary.
pub fn parse<L, S>(lines: L) -> ParsedLog
where
    L: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = LogParser::new(lines);
    let records = parser
        .by_ref()
        .filter_map(|result| match result {
            Ok(record) => Some(record),
            Err(error) => {
                warn!("skipping {}", error);
                None
            }
        })
        .collect();
    ParsedLog {
        records,
        summary: parser.into_summary(),
    }
}

/// Parse a whole log, handling malformed lines according to `policy`.
pub fn parse_with_policy<L, S>(lines: L, policy: ParsePolicy) -> Result<ParsedLog, ParseError>
where
    L: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    match policy {
        ParsePolicy::Skip => Ok(parse(lines)),
        ParsePolicy::Abort => {
            let mut parser = LogParser::new(lines);
            let records = parser.by_ref().collect::<Result<Vec<_>, _>>()?;
            Ok(ParsedLog {
                records,
                summary: parser.into_summary(),
            })
        }
    }
}
