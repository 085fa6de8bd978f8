//! Inter-event times and fixed-width histograms.
//!
//! The inter-arrival series is taken from the sent timestamps of completed requests, in log order;
//! the inter-rejection series from the rejection timestamps. Both are binned by [`bucketize`] into
//! `[start, start + inc)`, `[start + inc, start + 2 * inc)`, ... with the last bin closed by `end`.

use qlog_models::{completions, rejections, EventRecord, Timestamp};
use serde_derive::{Deserialize, Serialize};

use crate::{error::check_non_decreasing, error::MetricsError, summary::SummaryStats};

/// Upper limit on the number of bins a single [`BinSpec`] may describe.
pub const MAX_BINS: usize = 1 << 24;

/// Tolerance used when snapping a value to a bin edge.
const EDGE_EPSILON: f64 = 1e-9;

pub fn arrival_timestamps(records: &[EventRecord]) -> Vec<Timestamp> {
    completions(records).map(|c| c.sent_timestamp).collect()
}

pub fn rejection_timestamps(records: &[EventRecord]) -> Vec<Timestamp> {
    rejections(records).map(|r| r.rejection_timestamp).collect()
}

pub fn service_lengths(records: &[EventRecord]) -> Vec<f64> {
    completions(records).map(|c| c.service_length).collect()
}

/// Differences between consecutive timestamps.
pub fn inter_event_times(timestamps: &[Timestamp]) -> Result<Vec<f64>, MetricsError> {
    const STATISTIC: &str = "inter-event time";
    if timestamps.len() < 2 {
        return Err(MetricsError::insufficient(
            STATISTIC,
            "timestamps",
            2,
            timestamps.len(),
        ));
    }
    check_non_decreasing(STATISTIC, timestamps.iter().copied())?;
    Ok(timestamps.windows(2).map(|pair| pair[1] - pair[0]).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InterEventStats {
    pub intervals: SummaryStats,
}

impl InterEventStats {
    /// Events per unit of time; for arrivals this is the estimated arrival rate.
    pub fn rate(&self) -> Option<f64> {
        (self.intervals.mean > 0.0).then(|| 1.0 / self.intervals.mean)
    }
}

pub fn inter_event_stats(timestamps: &[Timestamp]) -> Result<InterEventStats, MetricsError> {
    let intervals = inter_event_times(timestamps)?;
    let intervals = SummaryStats::from_samples(&intervals).ok_or_else(|| {
        MetricsError::insufficient("inter-event time", "timestamps", 2, timestamps.len())
    })?;
    Ok(InterEventStats { intervals })
}

/// Fixed-width bins covering `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinSpec {
    pub start: f64,
    pub end: f64,
    pub increment: f64,
}

impl BinSpec {
    pub const fn new(start: f64, end: f64, increment: f64) -> Self {
        Self {
            start,
            end,
            increment,
        }
    }

    /// Number of bins, or why there are none.
    pub fn bin_count(&self) -> Result<usize, MetricsError> {
        let BinSpec {
            start,
            end,
            increment,
        } = *self;
        if !(start.is_finite() && end.is_finite() && increment.is_finite()) {
            return Err(MetricsError::InvalidBins(format!(
                "bounds must be finite, got {}..{} step {}",
                start, end, increment
            )));
        }
        if increment <= 0.0 {
            return Err(MetricsError::InvalidBins(format!(
                "increment must be positive, got {}",
                increment
            )));
        }
        if end <= start {
            return Err(MetricsError::InvalidBins(format!(
                "end {} must be greater than start {}",
                end, start
            )));
        }
        let count = ((end - start) / increment - EDGE_EPSILON).ceil();
        if count > MAX_BINS as f64 {
            return Err(MetricsError::InvalidBins(format!(
                "{}..{} step {} needs {} bins, at most {} are allowed",
                start, end, increment, count, MAX_BINS
            )));
        }
        Ok((count as usize).max(1))
    }

    /// `(lower, upper)` of every bin, in order. The last upper bound is exactly `end`.
    pub fn bounds(&self) -> Result<Vec<(f64, f64)>, MetricsError> {
        let count = self.bin_count()?;
        let mut bounds = (0..count)
            .map(|i| {
                (
                    self.start + i as f64 * self.increment,
                    self.start + (i + 1) as f64 * self.increment,
                )
            })
            .collect::<Vec<_>>();
        if let Some(last) = bounds.last_mut() {
            last.1 = self.end;
        }
        Ok(bounds)
    }

    /// Bin holding `value`, if it lies in `[start, end)`.
    fn index_of(&self, value: f64, count: usize) -> Option<usize> {
        if !(self.start <= value && value < self.end) {
            return None;
        }
        let position = (value - self.start) / self.increment;
        let mut index = position.floor();
        // 0.3 / 0.1 is 2.9999999999999996, which belongs to the bin starting at 0.3
        if position - index > 1.0 - EDGE_EPSILON {
            index += 1.0;
        }
        Some((index as usize).min(count - 1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl Bin {
    pub fn label(&self) -> String {
        format!("{:.3}-{:.3}", self.lower, self.upper)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<Bin>,
    /// values outside `[start, end)`, including NaN
    pub out_of_range: usize,
    pub normalizer: Option<f64>,
}

impl Histogram {
    pub fn counts(&self) -> Vec<usize> {
        self.bins.iter().map(|bin| bin.count).collect()
    }

    /// `count / normalizer` per bin, when a normalizer was given.
    pub fn densities(&self) -> Option<Vec<f64>> {
        let normalizer = self.normalizer?;
        Some(
            self.bins
                .iter()
                .map(|bin| bin.count as f64 / normalizer)
                .collect(),
        )
    }

    /// Values counted in some bin.
    pub fn total(&self) -> usize {
        self.bins.iter().map(|bin| bin.count).sum()
    }
}

/// Count `values` into fixed-width bins.
pub fn bucketize(
    values: &[f64],
    bins: BinSpec,
    normalize_by: Option<f64>,
) -> Result<Histogram, MetricsError> {
    if let Some(normalizer) = normalize_by {
        if !(normalizer.is_finite() && normalizer > 0.0) {
            return Err(MetricsError::InvalidBins(format!(
                "normalizer must be positive and finite, got {}",
                normalizer
            )));
        }
    }
    let bounds = bins.bounds()?;
    let mut counts = vec![0usize; bounds.len()];
    let mut out_of_range = 0;
    for &value in values {
        match bins.index_of(value, counts.len()) {
            Some(index) => counts[index] += 1,
            None => out_of_range += 1,
        }
    }
    let bins: Vec<Bin> = bounds
        .into_iter()
        .zip(counts)
        .map(|((lower, upper), count)| Bin {
            lower,
            upper,
            count,
        })
        .collect();
    Ok(Histogram {
        bins,
        out_of_range,
        normalizer: normalize_by,
    })
}

#[cfg(test)]
mod tests {
    use qlog_models::{Completion, QueueSnapshot, Rejection};

    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn records() -> Vec<EventRecord> {
        vec![
            Completion::new(0, 0.0, 0.2, 0.0, 0.2).into(),
            QueueSnapshot::new(0).into(),
            Rejection::new(1, 0.25, 0.25).into(),
            Completion::new(2, 0.5, 0.1, 0.5, 0.6).into(),
            Rejection::new(3, 1.75, 1.75).into(),
            Completion::new(4, 1.5, 0.3, 1.5, 1.8).into(),
        ]
    }

    #[test]
    fn test_series_keep_log_order() {
        assert_eq!(arrival_timestamps(&records()), vec![0.0, 0.5, 1.5]);
        assert_eq!(rejection_timestamps(&records()), vec![0.25, 1.75]);
        assert_eq!(service_lengths(&records()), vec![0.2, 0.1, 0.3]);
    }

    #[test]
    fn test_inter_event_times() {
        assert_eq!(
            inter_event_times(&arrival_timestamps(&records())).unwrap(),
            vec![0.5, 1.0]
        );
        assert_eq!(inter_event_times(&[1.0, 1.0]).unwrap(), vec![0.0]);
        assert!(inter_event_times(&[1.0]).unwrap_err().is_insufficient_data());
        assert!(inter_event_times(&[]).unwrap_err().is_insufficient_data());
        assert!(matches!(
            inter_event_times(&[0.0, 0.5, 0.2]),
            Err(MetricsError::OutOfOrder { position: 2, .. })
        ));
    }

    #[test]
    fn test_rate() {
        let stats = inter_event_stats(&[0.0, 0.5, 1.0, 2.0]).unwrap();
        assert_eq!(stats.intervals.count, 3);
        assert_close(stats.rate().unwrap(), 1.5);
        let simultaneous = inter_event_stats(&[3.0, 3.0]).unwrap();
        assert_eq!(simultaneous.rate(), None);
    }

    #[test]
    fn test_bucketize() {
        let histogram = bucketize(&[0.1, 0.3, 0.49999], BinSpec::new(0.0, 0.5, 0.1), Some(1.0))
            .unwrap();
        let labels = histogram.bins.iter().map(Bin::label).collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec![
                "0.000-0.100",
                "0.100-0.200",
                "0.200-0.300",
                "0.300-0.400",
                "0.400-0.500"
            ]
        );
        assert_eq!(histogram.counts(), vec![0, 1, 0, 1, 1]);
        assert_eq!(histogram.densities().unwrap(), vec![0.0, 1.0, 0.0, 1.0, 1.0]);
        assert_eq!(histogram.out_of_range, 0);
        assert_eq!(histogram.total(), 3);
    }

    #[test]
    fn test_edges() {
        let bins = BinSpec::new(0.0, 0.5, 0.1);
        let histogram = bucketize(&[0.0, 0.5, -0.1, 7.0, f64::NAN, 0.1], bins, None).unwrap();
        assert_eq!(histogram.counts(), vec![1, 1, 0, 0, 0]);
        assert_eq!(histogram.out_of_range, 4);
        assert_eq!(histogram.densities(), None);
    }

    #[test]
    fn test_uneven_last_bin() {
        let bins = BinSpec::new(0.0, 1.0, 0.3);
        let bounds = bins.bounds().unwrap();
        assert_eq!(bounds.len(), 4);
        assert_eq!(bounds[3].1, 1.0);
        let histogram = bucketize(&[0.95, 0.6, 0.299], bins, Some(3.0)).unwrap();
        assert_eq!(histogram.counts(), vec![1, 0, 1, 1]);
        assert_close(histogram.densities().unwrap()[3], 1.0 / 3.0);
    }

    #[test]
    fn test_default_ranges() {
        let arrivals = BinSpec::new(0.0, 2.0, 0.005);
        assert_eq!(arrivals.bin_count().unwrap(), 400);
        let bounds = arrivals.bounds().unwrap();
        let last = Bin {
            lower: bounds[399].0,
            upper: bounds[399].1,
            count: 0,
        };
        assert_eq!(last.label(), "1.995-2.000");
        assert_eq!(BinSpec::new(0.0, 20.5, 0.05).bin_count().unwrap(), 410);
    }

    #[test]
    fn test_invalid_bins() {
        for bins in [
            BinSpec::new(0.0, 1.0, 0.0),
            BinSpec::new(0.0, 1.0, -0.1),
            BinSpec::new(1.0, 1.0, 0.1),
            BinSpec::new(2.0, 1.0, 0.1),
            BinSpec::new(0.0, f64::INFINITY, 0.1),
            BinSpec::new(f64::NAN, 1.0, 0.1),
            BinSpec::new(0.0, 1.0, 1e-9),
        ] {
            assert!(
                matches!(bucketize(&[0.5], bins, None), Err(MetricsError::InvalidBins(_))),
                "{:?}",
                bins
            );
        }
        let bins = BinSpec::new(0.0, 1.0, 0.1);
        for normalizer in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(bucketize(&[0.5], bins, Some(normalizer)).is_err());
        }
    }
}
