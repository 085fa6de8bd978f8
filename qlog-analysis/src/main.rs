mod config;
mod data;
mod error;
mod report;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use config::{BatchConfig, INTER_ARRIVAL_BINS, INTER_REJECTION_BINS, SERVICE_LENGTH_BINS};
use error::AnalysisError;
use qlog_metrics::{
    arrival_timestamps, bucketize, inter_event_times, rejection_timestamps, service_lengths,
    BinSpec, Histogram,
};
use qlog_models::EventRecord;
use qlog_preprocess::{demultiplex, ParsePolicy};
use report::{LogReport, ReportRow};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Series {
    /// time between the sent timestamps of consecutive completed requests
    Arrival,
    /// time between consecutive rejections
    Rejection,
    /// requested service time of completed requests
    Service,
}

impl Series {
    fn default_bins(self) -> BinSpec {
        match self {
            Series::Arrival => INTER_ARRIVAL_BINS,
            Series::Rejection => INTER_REJECTION_BINS,
            Series::Service => SERVICE_LENGTH_BINS,
        }
    }

    fn values(self, records: &[EventRecord]) -> Result<Vec<f64>, AnalysisError> {
        Ok(match self {
            Series::Arrival => inter_event_times(&arrival_timestamps(records))?,
            Series::Rejection => inter_event_times(&rejection_timestamps(records))?,
            Series::Service => service_lengths(records),
        })
    }
}

/// Compute the histogram of `series`, normalized by the number of values when `normalize` is set.
fn series_histogram(
    series: Series,
    records: &[EventRecord],
    bins: BinSpec,
    normalize: bool,
) -> Result<Histogram, AnalysisError> {
    let values = series.values(records)?;
    let normalizer = (normalize && !values.is_empty()).then_some(values.len() as f64);
    Ok(bucketize(&values, bins, normalizer)?)
}

fn print_histogram(series: Series, histogram: &Histogram) {
    println!(
        "{:?} distribution ({} binned, {} out of range):",
        series,
        histogram.total(),
        histogram.out_of_range
    );
    let densities = histogram.densities();
    for (i, bin) in histogram.bins.iter().enumerate() {
        if bin.count == 0 {
            continue;
        }
        match &densities {
            Some(densities) => println!("  {}: {} ({:.6})", bin.label(), bin.count, densities[i]),
            None => println!("  {}: {}", bin.label(), bin.count),
        }
    }
}

/// Reports of one log: the whole log first, then each worker when `per_worker` is set.
fn analyze_log(
    path: &Path,
    policy: ParsePolicy,
    per_worker: bool,
) -> Result<(Vec<EventRecord>, Vec<LogReport>), AnalysisError> {
    let name = data::log_name(path);
    let parsed = data::load_log(path, policy)?;
    info!(log = %name, "{}", parsed.summary);

    let streams = demultiplex(parsed.records.clone());
    let mut reports = vec![LogReport::for_log(&name, &parsed.records, &streams)];
    match (&streams, per_worker) {
        (Ok(streams), true) => reports.extend(
            streams
                .iter()
                .filter(|(worker, _)| worker.id().is_some())
                .map(|(worker, records)| LogReport::for_worker(&name, *worker, records)),
        ),
        (Err(e), true) => warn!(log = %name, "no per-worker reports: {}", e),
        _ => {}
    }
    Ok((parsed.records, reports))
}

fn run_batch(config_path: &Path, csv_path: Option<&Path>) -> Result<(), AnalysisError> {
    let config = BatchConfig::load(config_path)?;
    info!(logs = config.logs.len(), "running batch");
    let mut rows: Vec<ReportRow> = Vec::new();
    let mut failed = 0;
    for path in &config.logs {
        let (records, reports) = match analyze_log(path, config.parse_policy, config.per_worker) {
            Ok(result) => result,
            Err(e) => {
                error!(log = %path.display(), "skipping log: {}", e);
                failed += 1;
                continue;
            }
        };
        for report in &reports {
            println!("{}\n", report);
            rows.push(report.row());
        }
        for (series, bins) in [
            (Series::Arrival, config.inter_arrival),
            (Series::Rejection, config.inter_rejection),
            (Series::Service, config.service_length),
        ] {
            match series_histogram(series, &records, bins, true) {
                Ok(histogram) => print_histogram(series, &histogram),
                Err(e) => warn!(log = %path.display(), ?series, "no histogram: {}", e),
            }
        }
    }

    if let Some(csv_path) = csv_path {
        let mut writer = csv::Writer::from_path(csv_path)?;
        for row in &rows {
            writer.serialize(row)?;
        }
        writer
            .flush()
            .map_err(|e| AnalysisError::io(csv_path, e))?;
        info!(rows = rows.len(), path = %csv_path.display(), "wrote csv");
    }
    if failed > 0 {
        warn!(failed, "some logs could not be analyzed");
    }
    Ok(())
}

fn head(path: &Path, n: usize) -> Result<(), AnalysisError> {
    let parsed = data::load_log(path, ParsePolicy::Skip)?;
    for record in parsed.records.iter().take(n) {
        println!("{:?}", record);
    }
    Ok(())
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a log and print every statistic.
    Analyze {
        #[clap(required = true)]
        log_path: PathBuf,
        #[clap(long, short = 'w', help = "also report each worker of a tagged log")]
        per_worker: bool,
        #[clap(long, help = "stop at the first malformed line")]
        strict: bool,
    },
    /// Print the distribution of one series of a log.
    Histogram {
        #[clap(required = true)]
        log_path: PathBuf,
        #[clap(long, short = 's', value_enum)]
        series: Series,
        #[clap(long, help = "lower bound of the first bin [default depends on the series]")]
        start: Option<f64>,
        #[clap(long, help = "upper bound of the last bin")]
        end: Option<f64>,
        #[clap(long, short = 'i', help = "bin width")]
        increment: Option<f64>,
        #[clap(long, help = "also print counts divided by the number of values")]
        normalize: bool,
    },
    /// Analyze every log listed in a TOML config.
    Batch {
        #[clap(required = true)]
        config_path: PathBuf,
        #[clap(long, help = "write one row per log and worker to this file")]
        csv: Option<PathBuf>,
    },
    /// Print the first parsed records of a log.
    Head {
        #[clap(required = true)]
        log_path: PathBuf,
        #[clap(long, short = 'n', default_value = "10")]
        n: usize,
    },
}

#[derive(Parser, Debug)]
#[command(about = "Compute performance statistics from queue-simulator logs.")]
struct Args {
    #[clap(long, global = true, default_value = "info")]
    log_level: tracing::Level,
    #[clap(subcommand)]
    command: Command,
}

fn main() -> Result<(), AnalysisError> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Analyze {
            log_path,
            per_worker,
            strict,
        } => {
            let policy = if strict {
                ParsePolicy::Abort
            } else {
                ParsePolicy::Skip
            };
            let (_, reports) = analyze_log(&log_path, policy, per_worker)?;
            for report in reports {
                println!("{}\n", report);
            }
        }
        Command::Histogram {
            log_path,
            series,
            start,
            end,
            increment,
            normalize,
        } => {
            let defaults = series.default_bins();
            let bins = BinSpec::new(
                start.unwrap_or(defaults.start),
                end.unwrap_or(defaults.end),
                increment.unwrap_or(defaults.increment),
            );
            let parsed = data::load_log(&log_path, ParsePolicy::Skip)?;
            let histogram = series_histogram(series, &parsed.records, bins, normalize)?;
            print_histogram(series, &histogram);
        }
        Command::Batch { config_path, csv } => run_batch(&config_path, csv.as_deref())?,
        Command::Head { log_path, n } => head(&log_path, n)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(name: &str) -> PathBuf {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("../qlog-preprocess/test-resources");
        path.push(name);
        path
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from([
            "qlog-analysis",
            "histogram",
            "log.txt",
            "--series",
            "rejection",
            "--increment",
            "0.5",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.log_level, tracing::Level::DEBUG);
        match args.command {
            Command::Histogram {
                series,
                increment,
                start,
                normalize,
                ..
            } => {
                assert_eq!(series, Series::Rejection);
                assert_eq!(increment, Some(0.5));
                assert_eq!(start, None);
                assert!(!normalize);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Args::try_parse_from(["qlog-analysis", "histogram", "log.txt"]).is_err());
    }

    #[test]
    fn test_analyze_per_worker() {
        let (records, reports) =
            analyze_log(&resource("server-multi-sample.txt"), ParsePolicy::Skip, true).unwrap();
        assert_eq!(records.len(), 19);
        let workers = reports
            .iter()
            .map(|report| report.worker.to_string())
            .collect::<Vec<_>>();
        assert_eq!(workers, vec!["all", "T0", "T1"]);

        let (_, reports) =
            analyze_log(&resource("server-q-sample.txt"), ParsePolicy::Skip, true).unwrap();
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_untagged_rejection_keeps_whole_log_report() {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("test-resources/server-multi-early-rejection.txt");
        for per_worker in [false, true] {
            let (_, reports) = analyze_log(&path, ParsePolicy::Skip, per_worker).unwrap();
            assert_eq!(reports.len(), 1);
            let report = &reports[0];
            assert!(matches!(
                &report.utilization,
                Err(crate::error::StatisticError::Ungrouped(e)) if e.position == 0
            ));
            assert!(report.response_time.is_ok());
            assert_eq!(report.rejection_rate, Ok(0.5));
            assert_eq!(report.queue_length, Some(Ok(0.0)));
            assert!(report.inter_arrival.is_ok());
            assert!(report.inter_rejection.is_ok());
            assert_eq!(report.row().utilization, None);
        }
    }

    #[test]
    fn test_series_histogram() {
        let (records, _) =
            analyze_log(&resource("server-q-sample.txt"), ParsePolicy::Skip, false).unwrap();
        // inter-arrival times 0.1, 0.4, 0.1, 0.05
        let histogram =
            series_histogram(Series::Arrival, &records, BinSpec::new(0.0, 0.5, 0.1), true)
                .unwrap();
        assert_eq!(histogram.counts(), vec![1, 2, 0, 0, 1]);
        assert_eq!(histogram.normalizer, Some(4.0));

        let histogram =
            series_histogram(Series::Service, &records, SERVICE_LENGTH_BINS, false).unwrap();
        assert_eq!(histogram.total(), 5);
        assert!(series_histogram(Series::Rejection, &records, INTER_REJECTION_BINS, true).is_err());
    }
}
