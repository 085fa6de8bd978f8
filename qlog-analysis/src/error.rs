use std::path::PathBuf;

use qlog_metrics::MetricsError;
use qlog_preprocess::{ParseError, UngroupedRecordError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Ungrouped(#[from] UngroupedRecordError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("cannot write csv: {0}")]
    Csv(#[from] csv::Error),
}

impl AnalysisError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a single statistic of a report is missing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatisticError {
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    /// the log could not be split into worker streams
    #[error(transparent)]
    Ungrouped(#[from] UngroupedRecordError),
}

impl StatisticError {
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, StatisticError::Metrics(e) if e.is_insufficient_data())
    }
}
