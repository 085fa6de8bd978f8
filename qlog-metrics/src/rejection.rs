use qlog_models::EventRecord;
use serde_derive::Serialize;

use crate::error::MetricsError;

/// Completed and rejected requests of a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestCounts {
    pub completions: usize,
    pub rejections: usize,
}

impl RequestCounts {
    pub fn submitted(&self) -> usize {
        self.completions + self.rejections
    }
}

pub fn count_requests(records: &[EventRecord]) -> RequestCounts {
    records
        .iter()
        .fold(RequestCounts::default(), |mut counts, record| {
            match record {
                EventRecord::Completion(_) => counts.completions += 1,
                EventRecord::Rejection(_) => counts.rejections += 1,
                _ => {}
            }
            counts
        })
}

/// Rejections over submitted requests, as a fraction in `[0, 1]`.
pub fn rejection_rate(records: &[EventRecord]) -> Result<f64, MetricsError> {
    let counts = count_requests(records);
    if counts.submitted() == 0 {
        return Err(MetricsError::insufficient(
            "rejection rate",
            "submitted requests",
            1,
            0,
        ));
    }
    Ok(counts.rejections as f64 / counts.submitted() as f64)
}

#[cfg(test)]
mod tests {
    use qlog_models::{Completion, QueueSnapshot, Rejection};

    use super::*;

    fn fixture(completions: usize, rejections: usize) -> Vec<EventRecord> {
        let mut records: Vec<EventRecord> = Vec::new();
        for i in 0..completions {
            let t = i as f64;
            records.push(Completion::new(i as u64, t, 0.5, t, t + 0.5).into());
            records.push(QueueSnapshot::new(0).into());
        }
        for i in 0..rejections {
            let t = (completions + i) as f64;
            records.push(Rejection::new((completions + i) as u64, t, t).into());
        }
        records
    }

    #[test]
    fn test_rejection_rate() {
        let records = fixture(8, 2);
        assert_eq!(
            count_requests(&records),
            RequestCounts {
                completions: 8,
                rejections: 2
            }
        );
        assert!((rejection_rate(&records).unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_no_rejections() {
        assert_eq!(rejection_rate(&fixture(5, 0)).unwrap(), 0.0);
        assert_eq!(rejection_rate(&fixture(0, 3)).unwrap(), 1.0);
    }

    #[test]
    fn test_nothing_submitted() {
        let snapshots_only: Vec<EventRecord> = vec![QueueSnapshot::new(1).into()];
        assert!(rejection_rate(&snapshots_only)
            .unwrap_err()
            .is_insufficient_data());
        assert!(rejection_rate(&[]).is_err());
    }
}
