use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("{statistic} needs at least {required} {what}, found {found}")]
    InsufficientData {
        statistic: &'static str,
        what: &'static str,
        required: usize,
        found: usize,
    },
    /// The records span no time at all, e.g. a single zero-length request.
    #[error("{statistic} needs a window of positive length, got {elapsed}")]
    DegenerateWindow { statistic: &'static str, elapsed: f64 },
    #[error("{statistic}: timestamp {current} at position {position} is earlier than the preceding {previous}")]
    OutOfOrder {
        statistic: &'static str,
        position: usize,
        previous: f64,
        current: f64,
    },
    #[error("invalid bins: {0}")]
    InvalidBins(String),
}

impl MetricsError {
    pub(crate) fn insufficient(
        statistic: &'static str,
        what: &'static str,
        required: usize,
        found: usize,
    ) -> Self {
        MetricsError::InsufficientData {
            statistic,
            what,
            required,
            found,
        }
    }

    /// Whether the window was too small for the statistic, as opposed to being malformed.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            MetricsError::InsufficientData { .. } | MetricsError::DegenerateWindow { .. }
        )
    }
}

/// Fail with [`MetricsError::OutOfOrder`] at the first timestamp smaller than its predecessor.
pub(crate) fn check_non_decreasing<I>(statistic: &'static str, timestamps: I) -> Result<(), MetricsError>
where
    I: IntoIterator<Item = f64>,
{
    let mut previous: Option<f64> = None;
    for (position, current) in timestamps.into_iter().enumerate() {
        if let Some(previous) = previous {
            if current < previous {
                return Err(MetricsError::OutOfOrder {
                    statistic,
                    position,
                    previous,
                    current,
                });
            }
        }
        previous = Some(current);
    }
    Ok(())
}
