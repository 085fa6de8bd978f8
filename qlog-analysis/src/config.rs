use std::path::{Path, PathBuf};

use qlog_metrics::BinSpec;
use qlog_preprocess::ParsePolicy;
use serde_derive::Deserialize;

use crate::error::AnalysisError;

pub const INTER_ARRIVAL_BINS: BinSpec = BinSpec::new(0.0, 2.0, 0.005);
pub const SERVICE_LENGTH_BINS: BinSpec = BinSpec::new(0.0, 2.0, 0.005);
pub const INTER_REJECTION_BINS: BinSpec = BinSpec::new(0.0, 20.5, 0.05);

fn default_inter_arrival() -> BinSpec {
    INTER_ARRIVAL_BINS
}

fn default_service_length() -> BinSpec {
    SERVICE_LENGTH_BINS
}

fn default_inter_rejection() -> BinSpec {
    INTER_REJECTION_BINS
}

/// A batch of logs analyzed with the same settings.
///
/// ```toml
/// logs = ["server-a.txt", "server-b.txt"]
/// per_worker = true
///
/// [inter_rejection]
/// start = 0.0
/// end = 10.0
/// increment = 0.1
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// relative paths are resolved against the directory of the config file
    pub logs: Vec<PathBuf>,
    #[serde(default)]
    pub per_worker: bool,
    #[serde(default)]
    pub parse_policy: ParsePolicy,
    #[serde(default = "default_inter_arrival")]
    pub inter_arrival: BinSpec,
    #[serde(default = "default_inter_rejection")]
    pub inter_rejection: BinSpec,
    #[serde(default = "default_service_length")]
    pub service_length: BinSpec,
}

impl BatchConfig {
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let toml_str = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        let mut config: BatchConfig = toml::from_str(&toml_str)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.logs = config.logs.iter().map(|log| base.join(log)).collect();
        Ok(config)
    }
}
