//! Per-request statistics over the completions of a window.

use qlog_models::{completions, Completion, EventRecord};

use crate::{error::MetricsError, summary::SummaryStats};

fn completion_stats<F>(
    records: &[EventRecord],
    statistic: &'static str,
    sample: F,
) -> Result<SummaryStats, MetricsError>
where
    F: Fn(&Completion) -> Option<f64>,
{
    let samples = completions(records).filter_map(sample).collect::<Vec<_>>();
    SummaryStats::from_samples(&samples)
        .ok_or_else(|| MetricsError::insufficient(statistic, "completions", 1, 0))
}

/// Response time (`completion - sent`) of every completion in the window.
pub fn response_time_stats(records: &[EventRecord]) -> Result<SummaryStats, MetricsError> {
    completion_stats(records, "response time", |c| Some(c.response_time()))
}

/// Requested service time of every completion in the window.
pub fn service_length_stats(records: &[EventRecord]) -> Result<SummaryStats, MetricsError> {
    completion_stats(records, "service length", |c| Some(c.service_length))
}

/// Queueing delay (`start - receipt`), over the completions that carry a start timestamp.
pub fn waiting_time_stats(records: &[EventRecord]) -> Result<SummaryStats, MetricsError> {
    completion_stats(records, "waiting time", Completion::waiting_time)
}
