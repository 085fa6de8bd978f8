use std::{
    io::{BufRead, BufReader},
    path::Path,
};

use qlog_preprocess::{parse_with_policy, ParsePolicy, ParsedLog};

use crate::error::AnalysisError;

/// Read a simulator log and parse it with `policy`.
pub fn load_log(path: &Path, policy: ParsePolicy) -> Result<ParsedLog, AnalysisError> {
    let file = std::fs::File::open(path).map_err(|e| AnalysisError::io(path, e))?;
    let reader = BufReader::new(file);
    let lines = reader
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AnalysisError::io(path, e))?;
    Ok(parse_with_policy(lines, policy)?)
}

/// File name used to label reports.
pub fn log_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
