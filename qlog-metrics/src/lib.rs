//! Performance statistics over the records of a queue-simulator log.
//!
//! Every statistic is a pure function of a record window, either a whole log or one worker stream
//! produced by `qlog_preprocess::demultiplex`, and fails with [`MetricsError`] when the window
//! holds too few qualifying records.

pub mod distribution;
pub mod error;
pub mod queue;
pub mod rejection;
pub mod response;
pub mod summary;
pub mod utilization;

pub use distribution::{
    arrival_timestamps, bucketize, inter_event_stats, inter_event_times, rejection_timestamps,
    service_lengths, Bin, BinSpec, Histogram, InterEventStats,
};
pub use error::MetricsError;
pub use queue::{queue_length_from_log, time_weighted_queue_length};
pub use rejection::{count_requests, rejection_rate, RequestCounts};
pub use response::{response_time_stats, service_length_stats, waiting_time_stats};
pub use summary::SummaryStats;
pub use utilization::{combined_utilization, utilization, Utilization, Window};
