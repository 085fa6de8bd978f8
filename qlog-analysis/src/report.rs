use std::fmt::Display;

use qlog_metrics::{
    arrival_timestamps, combined_utilization, count_requests, inter_event_stats,
    queue_length_from_log, rejection_rate, rejection_timestamps, response_time_stats,
    service_length_stats, utilization, waiting_time_stats, InterEventStats, MetricsError,
    RequestCounts, SummaryStats, Utilization,
};
use qlog_models::{EventRecord, Worker};
use qlog_preprocess::{UngroupedRecordError, WorkerStreams};
use serde_derive::Serialize;

use crate::error::StatisticError;

/// Every statistic of one record window. A statistic that cannot be computed keeps its error and
/// does not prevent the others.
#[derive(Debug, Clone, PartialEq)]
pub struct LogReport {
    pub log: String,
    pub worker: Worker,
    pub counts: RequestCounts,
    pub response_time: Result<SummaryStats, MetricsError>,
    pub waiting_time: Result<SummaryStats, MetricsError>,
    pub service_length: Result<SummaryStats, MetricsError>,
    pub utilization: Result<Utilization, StatisticError>,
    /// `None` for a single worker of a tagged log: snapshots describe the shared queue.
    pub queue_length: Option<Result<f64, MetricsError>>,
    pub rejection_rate: Result<f64, MetricsError>,
    pub inter_arrival: Result<InterEventStats, MetricsError>,
    pub inter_rejection: Result<InterEventStats, MetricsError>,
}

impl LogReport {
    fn with_utilization(
        log: &str,
        worker: Worker,
        records: &[EventRecord],
        utilization: Result<Utilization, StatisticError>,
        queue_length: Option<Result<f64, MetricsError>>,
    ) -> Self {
        Self {
            log: log.to_string(),
            worker,
            counts: count_requests(records),
            response_time: response_time_stats(records),
            waiting_time: waiting_time_stats(records),
            service_length: service_length_stats(records),
            utilization,
            queue_length,
            rejection_rate: rejection_rate(records),
            inter_arrival: inter_event_stats(&arrival_timestamps(records)),
            inter_rejection: inter_event_stats(&rejection_timestamps(records)),
        }
    }

    /// Report over a whole log. With worker tags, utilization sums the busy time of every worker;
    /// if the log could not be split into workers only the utilization is missing.
    pub fn for_log(
        log: &str,
        records: &[EventRecord],
        streams: &Result<WorkerStreams, UngroupedRecordError>,
    ) -> Self {
        let utilization = match streams {
            Ok(streams) if streams.keys().all(|worker| *worker == Worker::Implicit) => {
                utilization(records).map_err(StatisticError::from)
            }
            Ok(streams) => combined_utilization(streams.values()).map_err(StatisticError::from),
            Err(error) => Err(StatisticError::from(error.clone())),
        };
        Self::with_utilization(
            log,
            Worker::Implicit,
            records,
            utilization,
            Some(queue_length_from_log(records)),
        )
    }

    /// Report over the stream of a single worker.
    pub fn for_worker(log: &str, worker: Worker, records: &[EventRecord]) -> Self {
        let queue_length = match worker {
            Worker::Implicit => Some(queue_length_from_log(records)),
            Worker::Tagged(_) => None,
        };
        Self::with_utilization(
            log,
            worker,
            records,
            utilization(records).map_err(StatisticError::from),
            queue_length,
        )
    }

    pub fn row(&self) -> ReportRow {
        let response_time = self.response_time.as_ref().ok();
        ReportRow {
            log: self.log.clone(),
            worker: self.worker.to_string(),
            completions: self.counts.completions,
            rejections: self.counts.rejections,
            response_time_mean: response_time.map(|s| s.mean),
            response_time_stdev: response_time.map(|s| s.stdev),
            response_time_min: response_time.map(|s| s.min),
            response_time_max: response_time.map(|s| s.max),
            waiting_time_mean: self.waiting_time.as_ref().ok().map(|s| s.mean),
            service_length_mean: self.service_length.as_ref().ok().map(|s| s.mean),
            utilization: self.utilization.as_ref().ok().map(|u| u.fraction),
            queue_length: self.queue_length.clone().and_then(Result::ok),
            rejection_rate: self.rejection_rate.clone().ok(),
            arrival_rate: self.inter_arrival.as_ref().ok().and_then(InterEventStats::rate),
            inter_rejection_mean: self
                .inter_rejection
                .as_ref()
                .ok()
                .map(|s| s.intervals.mean),
        }
    }
}

/// One CSV line per report; statistics that failed are left empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub log: String,
    pub worker: String,
    pub completions: usize,
    pub rejections: usize,
    pub response_time_mean: Option<f64>,
    pub response_time_stdev: Option<f64>,
    pub response_time_min: Option<f64>,
    pub response_time_max: Option<f64>,
    pub waiting_time_mean: Option<f64>,
    pub service_length_mean: Option<f64>,
    pub utilization: Option<f64>,
    pub queue_length: Option<f64>,
    pub rejection_rate: Option<f64>,
    pub arrival_rate: Option<f64>,
    pub inter_rejection_mean: Option<f64>,
}

fn show<T, E, F>(result: &Result<T, E>, f: F) -> String
where
    E: Display,
    F: FnOnce(&T) -> String,
{
    match result {
        Ok(value) => f(value),
        Err(error) => format!("n/a ({})", error),
    }
}

fn show_stats(result: &Result<SummaryStats, MetricsError>) -> String {
    show(result, |s| {
        format!(
            "mean {:.6}, stdev {:.6}, min {:.6}, max {:.6} (n = {})",
            s.mean, s.stdev, s.min, s.max, s.count
        )
    })
}

fn show_inter_event(result: &Result<InterEventStats, MetricsError>) -> String {
    show(result, |s| match s.rate() {
        Some(rate) => format!("{}, rate {:.6}", show_stats(&Ok(s.intervals)), rate),
        None => show_stats(&Ok(s.intervals)),
    })
}

fn csv_field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl Display for LogReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let utilization = show(&self.utilization, |u| {
            let mut text = format!(
                "{:.6} (busy {:.6} over {:.6}, {} worker(s))",
                u.fraction, u.busy_time, u.elapsed, u.workers
            );
            if u.is_oversubscribed() {
                text += &format!(", oversubscribed: {:.6} per worker", u.per_worker());
            }
            text
        });
        let queue_length = match &self.queue_length {
            Some(result) => show(result, |q| format!("{:.6}", q)),
            None => "n/a (shared queue)".to_string(),
        };
        let row = self.row();
        write!(
            f,
            "log: {}, worker: {}\n\
            completions: {}, rejections: {}\n\
            response time: {}\n\
            waiting time: {}\n\
            service length: {}\n\
            utilization: {}\n\
            average queue length: {}\n\
            rejection rate: {}\n\
            inter-arrival time: {}\n\
            inter-rejection time: {}\n\
            CSV: {}, {}, {}, {}, {}, {}, {}, {}",
            self.log,
            self.worker,
            self.counts.completions,
            self.counts.rejections,
            show_stats(&self.response_time),
            show_stats(&self.waiting_time),
            show_stats(&self.service_length),
            utilization,
            queue_length,
            show(&self.rejection_rate, |r| format!("{:.6}", r)),
            show_inter_event(&self.inter_arrival),
            show_inter_event(&self.inter_rejection),
            row.log,
            row.worker,
            csv_field(row.response_time_mean),
            csv_field(row.utilization),
            csv_field(row.queue_length),
            csv_field(row.rejection_rate),
            csv_field(row.arrival_rate),
            csv_field(row.inter_rejection_mean),
        )
    }
}
