//! Time-weighted average of the queue depth.
//!
//! The queue depth is a step function: the snapshot written right after completion `i` holds until
//! completion `i + 1`. Its average is the area under the step function divided by the elapsed
//! window, which is the quantity Little's law relates to the response time.

use qlog_models::{Completion, EventRecord, QueueSnapshot};

use crate::{error::check_non_decreasing, error::MetricsError, utilization::Window};

const STATISTIC: &str = "time-weighted queue length";

/// Average queue depth over the window from the first receipt to the last completion.
///
/// `snapshots[i]` is the depth holding over `[completions[i], completions[i + 1])`; snapshots past
/// the last interval are not used.
pub fn time_weighted_queue_length(
    snapshots: &[QueueSnapshot],
    completions: &[Completion],
) -> Result<f64, MetricsError> {
    if completions.len() < 2 {
        return Err(MetricsError::insufficient(
            STATISTIC,
            "completions",
            2,
            completions.len(),
        ));
    }
    let intervals = completions.len() - 1;
    if snapshots.len() < intervals {
        return Err(MetricsError::insufficient(
            STATISTIC,
            "queue snapshots",
            intervals,
            snapshots.len(),
        ));
    }
    check_non_decreasing(
        STATISTIC,
        completions.iter().map(|c| c.completion_timestamp),
    )?;

    let elapsed = Window::of(completions)
        .map(|window| window.elapsed())
        .unwrap_or_default();
    if elapsed <= 0.0 {
        return Err(MetricsError::DegenerateWindow {
            statistic: STATISTIC,
            elapsed,
        });
    }

    let area: f64 = completions
        .windows(2)
        .zip(snapshots)
        .map(|(pair, snapshot)| {
            snapshot.queue_depth as f64
                * (pair[1].completion_timestamp - pair[0].completion_timestamp)
        })
        .sum();
    Ok(area / elapsed)
}

/// Pair each completion of a log with the queue snapshot written after it, and compute
/// [`time_weighted_queue_length`].
///
/// A completion with no snapshot before the next completion keeps the previous depth; the queue
/// starts empty. Snapshots before the first completion, rejections and worker tags are skipped.
pub fn queue_length_from_log(records: &[EventRecord]) -> Result<f64, MetricsError> {
    let mut completions = Vec::new();
    let mut snapshots: Vec<Option<QueueSnapshot>> = Vec::new();
    for record in records {
        match record {
            EventRecord::Completion(completion) => {
                completions.push(*completion);
                snapshots.push(None);
            }
            EventRecord::QueueSnapshot(snapshot) => {
                if let Some(last) = snapshots.last_mut() {
                    if last.is_none() {
                        *last = Some(*snapshot);
                    }
                }
            }
            _ => {}
        }
    }

    let mut depth = QueueSnapshot::new(0);
    let snapshots = snapshots
        .into_iter()
        .map(|snapshot| {
            if let Some(snapshot) = snapshot {
                depth = snapshot;
            }
            depth
        })
        .collect::<Vec<_>>();
    time_weighted_queue_length(&snapshots, &completions)
}

#[cfg(test)]
mod tests {
    use qlog_models::Rejection;

    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    /// Completions at 0, 1, 3 and 4; the first request is received at 0.
    fn completions() -> Vec<Completion> {
        vec![
            Completion::new(0, 0.0, 0.0, 0.0, 0.0),
            Completion::new(1, 0.0, 1.0, 0.0, 1.0),
            Completion::new(2, 0.5, 2.0, 0.5, 3.0),
            Completion::new(3, 2.0, 1.0, 2.0, 4.0),
        ]
    }

    fn depths(depths: &[usize]) -> Vec<QueueSnapshot> {
        depths.iter().copied().map(QueueSnapshot::new).collect()
    }

    #[test]
    fn test_three_intervals() {
        // (2 * 1 + 0 * 2 + 1 * 1) / 4
        let result = time_weighted_queue_length(&depths(&[2, 0, 1]), &completions()).unwrap();
        assert_close(result, 0.75);
    }

    #[test]
    fn test_trailing_snapshot_is_unused() {
        let result = time_weighted_queue_length(&depths(&[2, 0, 1, 9]), &completions()).unwrap();
        assert_close(result, 0.75);
    }

    #[test]
    fn test_elapsed_starts_at_first_receipt() {
        let mut completions = completions();
        completions.insert(0, Completion::new(9, 0.0, 0.0, 0.0, 0.0));
        // a zero-length interval adds no area whatever its depth
        let result = time_weighted_queue_length(&depths(&[5, 2, 0, 1]), &completions).unwrap();
        assert_close(result, 0.75);

        let mut shifted = self::completions();
        for c in shifted.iter_mut().skip(1) {
            c.completion_timestamp += 4.0;
            c.receipt_timestamp += 4.0;
            c.sent_timestamp += 4.0;
        }
        // the empty stretch before the second completion still counts toward the window
        let result = time_weighted_queue_length(&depths(&[0, 0, 1]), &shifted).unwrap();
        assert_close(result, 1.0 / 8.0);
    }

    #[test]
    fn test_out_of_order() {
        let mut completions = completions();
        completions.swap(1, 2);
        let error = time_weighted_queue_length(&depths(&[2, 0, 1]), &completions).unwrap_err();
        assert_eq!(
            error,
            MetricsError::OutOfOrder {
                statistic: STATISTIC,
                position: 2,
                previous: 3.0,
                current: 1.0
            }
        );
    }

    #[test]
    fn test_insufficient_data() {
        let one = &completions()[..1];
        assert!(time_weighted_queue_length(&depths(&[1]), one)
            .unwrap_err()
            .is_insufficient_data());
        assert_eq!(
            time_weighted_queue_length(&depths(&[1, 1]), &completions()),
            Err(MetricsError::InsufficientData {
                statistic: STATISTIC,
                what: "queue snapshots",
                required: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_from_log() {
        let c = completions();
        let records: Vec<EventRecord> = vec![
            QueueSnapshot::new(7).into(),
            c[0].into(),
            QueueSnapshot::new(2).into(),
            QueueSnapshot::new(3).into(),
            c[1].into(),
            Rejection::new(5, 1.5, 1.5).into(),
            QueueSnapshot::new(0).into(),
            c[2].into(),
            QueueSnapshot::new(1).into(),
            c[3].into(),
            QueueSnapshot::new(0).into(),
        ];
        assert_close(queue_length_from_log(&records).unwrap(), 0.75);

        // the completion at 3 has no snapshot and keeps depth 0
        let records: Vec<EventRecord> = vec![
            c[0].into(),
            QueueSnapshot::new(2).into(),
            c[1].into(),
            QueueSnapshot::new(0).into(),
            c[2].into(),
            c[3].into(),
        ];
        assert_close(queue_length_from_log(&records).unwrap(), 0.5);
    }
}
