use qlog_models::{completions, Completion, EventRecord, Timestamp};
use serde_derive::Serialize;
use tracing::warn;

use crate::error::MetricsError;

const STATISTIC: &str = "utilization";

/// Time span covered by a set of completions: from the earliest receipt to the latest completion.
///
/// The bounds are taken by timestamp, not by log position, so the window does not depend on the
/// order in which the completions were written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Window {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Window {
    pub fn of<'a, I>(completions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Completion>,
    {
        completions
            .into_iter()
            .map(|c| Window {
                start: c.receipt_timestamp,
                end: c.completion_timestamp,
            })
            .reduce(Window::union)
    }

    /// Smallest window covering both.
    pub fn union(self, other: Window) -> Self {
        Window {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn elapsed(&self) -> Timestamp {
        self.end - self.start
    }
}

/// Busy time over elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Utilization {
    pub busy_time: f64,
    pub elapsed: f64,
    pub fraction: f64,
    /// number of workers whose busy time is summed
    pub workers: usize,
}

impl Utilization {
    fn new(busy_time: f64, window: Window, workers: usize) -> Result<Self, MetricsError> {
        let elapsed = window.elapsed();
        if elapsed <= 0.0 {
            return Err(MetricsError::DegenerateWindow {
                statistic: STATISTIC,
                elapsed,
            });
        }
        let utilization = Self {
            busy_time,
            elapsed,
            fraction: busy_time / elapsed,
            workers,
        };
        if utilization.is_oversubscribed() {
            warn!(
                fraction = utilization.fraction,
                workers, "busy time exceeds the elapsed window"
            );
        }
        Ok(utilization)
    }

    /// More busy time than elapsed time: only possible when several workers share the window.
    pub fn is_oversubscribed(&self) -> bool {
        self.fraction > 1.0
    }

    /// Average utilization of each worker.
    pub fn per_worker(&self) -> f64 {
        self.fraction / self.workers.max(1) as f64
    }
}

/// Fraction of the window the server spent processing requests.
pub fn utilization(records: &[EventRecord]) -> Result<Utilization, MetricsError> {
    let window = Window::of(completions(records))
        .ok_or_else(|| MetricsError::insufficient(STATISTIC, "completions", 1, 0))?;
    let busy_time = completions(records).map(|c| c.service_length).sum();
    Utilization::new(busy_time, window, 1)
}

/// Busy time summed over several worker streams, against the single window they share.
pub fn combined_utilization<I, S>(streams: I) -> Result<Utilization, MetricsError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[EventRecord]>,
{
    let mut busy_time = 0.0;
    let mut workers = 0;
    let mut window: Option<Window> = None;
    for stream in streams {
        let stream = stream.as_ref();
        let Some(stream_window) = Window::of(completions(stream)) else {
            continue;
        };
        workers += 1;
        busy_time += completions(stream).map(|c| c.service_length).sum::<f64>();
        window = Some(match window {
            Some(window) => window.union(stream_window),
            None => stream_window,
        });
    }
    let window =
        window.ok_or_else(|| MetricsError::insufficient(STATISTIC, "completions", 1, 0))?;
    Utilization::new(busy_time, window, workers)
}

#[cfg(test)]
mod tests {
    use qlog_models::{QueueSnapshot, Rejection};

    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn sorted_fixture() -> Vec<EventRecord> {
        vec![
            Completion::new(0, 0.5, 1.0, 1.0, 2.0).into(),
            QueueSnapshot::new(1).into(),
            Completion::new(1, 1.5, 2.0, 1.6, 4.0).into(),
            QueueSnapshot::new(0).into(),
            Rejection::new(2, 4.5, 4.5).into(),
            Completion::new(3, 5.0, 1.0, 5.0, 6.0).into(),
        ]
    }

    #[test]
    fn test_window_anchored_at_first_receipt() {
        // busy 4.0 over [1.0, 6.0]; the first request was sent at 0.5 but received at 1.0
        let result = utilization(&sorted_fixture()).unwrap();
        assert_close(result.busy_time, 4.0);
        assert_close(result.elapsed, 5.0);
        assert_close(result.fraction, 0.8);
        assert!(!result.is_oversubscribed());
    }

    #[test]
    fn test_independent_of_log_position() {
        let mut shuffled = sorted_fixture();
        shuffled.reverse();
        shuffled.swap(0, 3);
        assert_eq!(
            utilization(&shuffled).unwrap(),
            utilization(&sorted_fixture()).unwrap()
        );
    }

    #[test]
    fn test_combined_workers_are_flagged() {
        let worker0: Vec<EventRecord> = vec![
            Completion::new(0, 0.0, 1.0, 0.0, 1.0).into(),
            Completion::new(1, 1.0, 1.0, 1.0, 2.0).into(),
        ];
        let worker1: Vec<EventRecord> = vec![
            Completion::new(0, 0.5, 1.5, 0.5, 2.0).into(),
            Completion::new(1, 0.5, 0.5, 0.5, 2.5).into(),
        ];
        let idle: Vec<EventRecord> = vec![Rejection::new(9, 1.0, 1.0).into()];
        let combined = combined_utilization([&worker0, &worker1, &idle]).unwrap();
        assert_eq!(combined.workers, 2);
        assert_close(combined.busy_time, 4.0);
        assert_close(combined.elapsed, 2.5);
        assert_close(combined.fraction, 1.6);
        assert!(combined.is_oversubscribed());
        assert_close(combined.per_worker(), 0.8);
    }

    #[test]
    fn test_insufficient_data() {
        assert!(utilization(&[]).unwrap_err().is_insufficient_data());
        let rejection_only: Vec<EventRecord> = vec![Rejection::new(0, 0.0, 0.1).into()];
        assert!(utilization(&rejection_only).is_err());
        let zero_length: Vec<EventRecord> = vec![Completion::new(0, 1.0, 0.0, 1.0, 1.0).into()];
        assert!(matches!(
            utilization(&zero_length),
            Err(MetricsError::DegenerateWindow { .. })
        ));
        let no_streams: [Vec<EventRecord>; 0] = [];
        assert!(combined_utilization(no_streams).is_err());
    }
}
