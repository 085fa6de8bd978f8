//! Parse a single line of a queue-simulator log.
//!
//! Example input:
//! ```text
//! R12:3.402113,0.051021,3.402150,3.455002,3.506101
//! Q:[R13,R14]
//! X15:3.410020,0.072001,3.410051
//! T1 R16:3.420000,0.100000,3.420020,3.506101,3.606200
//! ```

use qlog_models::{Completion, EventRecord, QueueSnapshot, Rejection, RequestId, WorkerId};

use crate::error::{ParseError, ParseErrorKind};

/// What a single log line turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// blank lines and simulator chatter such as `INFO: ...` or `[#WORKER#] ...`
    Ignored,
    Tag(WorkerId),
    Record(EventRecord),
    /// `T<k> R<n>:...`, as printed by the multi-worker server
    TaggedRecord(WorkerId, EventRecord),
}

/// Parse one line. `line_no` is only used to label the error.
pub fn parse_line(line_no: usize, line: &str) -> Result<Line, ParseError> {
    line_to_record(line.trim()).map_err(|kind| ParseError::new(line_no, line, kind))
}

fn line_to_record(line: &str) -> Result<Line, ParseErrorKind> {
    if let Some(payload) = line.strip_prefix("Q:") {
        return parse_snapshot(payload).map(|snapshot| Line::Record(snapshot.into()));
    }
    if has_record_prefix(line, 'T') {
        return parse_tagged(line);
    }
    match parse_request(line) {
        Some(record) => record.map(Line::Record),
        None => Ok(Line::Ignored),
    }
}

/// `Some` if the line starts like a completion or rejection record.
fn parse_request(line: &str) -> Option<Result<EventRecord, ParseErrorKind>> {
    if has_record_prefix(line, 'R') {
        Some(parse_completion(line).map(EventRecord::from))
    } else if has_record_prefix(line, 'X') {
        Some(parse_rejection(line).map(EventRecord::from))
    } else if line.starts_with(|c: char| c == 'R' || c == 'X') {
        // `Rx:...` is a record with a broken id, a bare `R` without payload is not a record
        line.split_once(':')
            .map(|(head, _)| Err(ParseErrorKind::InvalidId(head[1..].to_string())))
    } else {
        None
    }
}

/// A record starts with its tag letter directly followed by a digit or the `:` separator.
fn has_record_prefix(line: &str, tag: char) -> bool {
    let mut chars = line.chars();
    chars.next() == Some(tag)
        && matches!(chars.next(), Some(c) if c.is_ascii_digit() || c == ':')
}

/// Split `R12:a,b,c` into the id and the comma-separated fields.
fn split_record(line: &str) -> Result<(RequestId, Vec<&str>), ParseErrorKind> {
    let (head, payload) = line
        .split_once(':')
        .ok_or(ParseErrorKind::MissingSeparator)?;
    let id_str = &head[1..];
    let id = id_str
        .trim()
        .parse::<RequestId>()
        .map_err(|_| ParseErrorKind::InvalidId(id_str.to_string()))?;
    Ok((id, payload.split(',').map(str::trim).collect()))
}

fn parse_number(field: &str) -> Result<f64, ParseErrorKind> {
    let value = field
        .parse::<f64>()
        .map_err(|_| ParseErrorKind::InvalidNumber(field.to_string()))?;
    if !value.is_finite() {
        return Err(ParseErrorKind::InvalidNumber(field.to_string()));
    }
    if value < 0.0 {
        return Err(ParseErrorKind::NegativeValue(field.to_string()));
    }
    Ok(value)
}

fn parse_numbers(fields: &[&str]) -> Result<Vec<f64>, ParseErrorKind> {
    fields.iter().map(|field| parse_number(field)).collect()
}

fn parse_completion(line: &str) -> Result<Completion, ParseErrorKind> {
    let (id, fields) = split_record(line)?;
    if !(4..=5).contains(&fields.len()) {
        return Err(ParseErrorKind::FieldCount {
            expected: "4 or 5",
            found: fields.len(),
        });
    }
    let completion = match parse_numbers(&fields)?.as_slice() {
        &[sent, length, receipt, completion] => {
            Completion::new(id, sent, length, receipt, completion)
        }
        &[sent, length, receipt, start, completion] => {
            Completion::new(id, sent, length, receipt, completion).with_start(start)
        }
        _ => unreachable!("field count checked above"),
    };
    if !completion.is_lifecycle_ordered() {
        return Err(ParseErrorKind::LifecycleOrder);
    }
    Ok(completion)
}

fn parse_rejection(line: &str) -> Result<Rejection, ParseErrorKind> {
    let (id, fields) = split_record(line)?;
    if !(2..=3).contains(&fields.len()) {
        return Err(ParseErrorKind::FieldCount {
            expected: "2 or 3",
            found: fields.len(),
        });
    }
    let rejection = match parse_numbers(&fields)?.as_slice() {
        &[sent, rejected] => Rejection::new(id, sent, rejected),
        &[sent, length, rejected] => Rejection::new(id, sent, rejected).with_service_length(length),
        _ => unreachable!("field count checked above"),
    };
    if rejection.rejection_timestamp < rejection.sent_timestamp {
        return Err(ParseErrorKind::LifecycleOrder);
    }
    Ok(rejection)
}

fn parse_snapshot(payload: &str) -> Result<QueueSnapshot, ParseErrorKind> {
    let inner = payload
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or(ParseErrorKind::MalformedSnapshot)?
        .trim();
    if inner.is_empty() {
        return Ok(QueueSnapshot::new(0));
    }
    let entries = inner.split(',').map(str::trim).collect::<Vec<_>>();
    if entries.iter().any(|entry| entry.is_empty()) {
        return Err(ParseErrorKind::MalformedSnapshot);
    }
    Ok(QueueSnapshot::new(entries.len()))
}

fn parse_tagged(line: &str) -> Result<Line, ParseErrorKind> {
    let rest = &line[1..];
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (digits, payload) = rest.split_at(digits_end);
    if !(payload.is_empty() || payload.starts_with(char::is_whitespace)) {
        return Err(ParseErrorKind::InvalidWorkerTag(line.to_string()));
    }
    let worker = digits
        .parse::<WorkerId>()
        .map_err(|_| ParseErrorKind::InvalidWorkerTag(line.to_string()))?;

    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(Line::Tag(worker));
    }
    match parse_request(payload) {
        Some(record) => record.map(|record| Line::TaggedRecord(worker, record)),
        None => Err(ParseErrorKind::UnexpectedTagPayload(payload.to_string())),
    }
}
