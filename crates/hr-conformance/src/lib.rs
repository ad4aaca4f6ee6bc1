#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hr_catalogue::{Catalogue, CatalogueError, SymbolTable, load_catalogue};
use hr_instance::{DEFAULT_CASE_NAME, InstanceError, InstanceLayout};
use hr_types::DEFAULT_TYPE_COUNT;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub mod oracle;
pub mod report;
pub mod sweep;
pub mod verify;

pub use oracle::{
    KernelType, OracleInvoker, OracleOutcome, OracleRequest, ProcessOracle, TaskType,
};
pub use report::{
    MismatchRecord, NotFoundRecord, RegressionReport, ResultAggregator, TypeReport,
};
pub use sweep::run_sweep;
pub use verify::{
    CountEntry, EXPECTED_COUNT, OracleResultRecord, TrialVerdict, parse_result_line,
    read_result_file, verify_result,
};

pub const DEFAULT_SAMPLES: usize = 50;
pub const RESULT_SUFFIX: &str = "_shgk.svml";
pub const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// What to do when a trial's result lacks the target type entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundPolicy {
    /// Stop the whole sweep at the first not-found trial.
    #[default]
    AbortSweep,
    /// Fail the current type, skip its remaining trials, continue with the next type.
    IsolateType,
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub catalogue_path: PathBuf,
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
    pub case_name: String,
    pub counter_bin: PathBuf,
    pub positive_examples: PathBuf,
    pub negative_examples: PathBuf,
    pub type_count: u32,
    pub samples: usize,
    pub kernel_type: KernelType,
    pub task_type: TaskType,
    pub subgraph_test: bool,
    pub not_found_policy: NotFoundPolicy,
    /// Sweep whatever the catalogue holds instead of requiring every id in
    /// `1..type_count`.
    pub allow_partial_catalogue: bool,
    pub oracle_timeout: Option<Duration>,
    pub type_filter: Option<u32>,
    pub seed: Option<u64>,
}

impl HarnessConfig {
    /// Layout of a regression checkout: catalogue, counter and example lists in
    /// the working directory, instances under `data/`, results under `results/`.
    #[must_use]
    pub fn default_paths() -> Self {
        Self {
            catalogue_path: PathBuf::from("hypergraphlets_description.txt"),
            data_dir: PathBuf::from("data"),
            results_dir: PathBuf::from("results"),
            case_name: DEFAULT_CASE_NAME.to_owned(),
            counter_bin: PathBuf::from("./run_hyperkernel"),
            positive_examples: PathBuf::from("examples.pos"),
            negative_examples: PathBuf::from("examples.neg"),
            type_count: DEFAULT_TYPE_COUNT,
            samples: DEFAULT_SAMPLES,
            kernel_type: KernelType::StandardHypergraphlet,
            task_type: TaskType::VertexClassification,
            subgraph_test: false,
            not_found_policy: NotFoundPolicy::AbortSweep,
            allow_partial_catalogue: false,
            oracle_timeout: None,
            type_filter: None,
            seed: None,
        }
    }

    #[must_use]
    pub fn instance_layout(&self) -> InstanceLayout {
        InstanceLayout::new(&self.data_dir, &self.case_name)
    }

    #[must_use]
    pub fn result_path(&self, type_id: u32) -> PathBuf {
        self.results_dir
            .join(format!("{}{type_id}{RESULT_SUFFIX}", self.case_name))
    }

    #[must_use]
    pub fn process_oracle(&self) -> ProcessOracle {
        ProcessOracle::new(&self.counter_bin).with_timeout(self.oracle_timeout)
    }

    pub fn load_catalogue(&self) -> Result<Catalogue, HarnessError> {
        Ok(load_catalogue(
            &self.catalogue_path,
            &SymbolTable::canonical(),
            self.type_count,
        )?)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::default_paths()
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),
    #[error(transparent)]
    Instance(#[from] InstanceError),
    #[error("type {0} is not described in the catalogue")]
    UnknownType(u32),
    #[error(
        "catalogue lacks {} of the types 1..{type_count}, first missing: {:?}",
        missing.len(),
        &missing[..missing.len().min(8)]
    )]
    IncompleteCatalogue { type_count: u32, missing: Vec<u32> },
    #[error("failed to launch counter {}: {source}", program.display())]
    OracleSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("counter command failed: status={status}, stderr={stderr}")]
    OracleCommandFailed { status: i32, stderr: String },
    #[error("counter {} did not finish within {timeout:?}", program.display())]
    OracleTimedOut { program: PathBuf, timeout: Duration },
    #[error("result file {} is unreadable: {source}", path.display())]
    ResultUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("result format error: {0}")]
    ResultFormat(String),
    #[error("type {type_id} NOT FOUND in counter output: {raw_line}")]
    TargetTypeNotFound { type_id: u32, raw_line: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflightReport {
    pub suite: &'static str,
    pub catalogue_present: bool,
    pub counter_present: bool,
    pub positive_examples_present: bool,
    pub negative_examples_present: bool,
}

impl PreflightReport {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.catalogue_present
            && self.counter_present
            && self.positive_examples_present
            && self.negative_examples_present
    }
}

#[must_use]
pub fn run_preflight(config: &HarnessConfig) -> PreflightReport {
    PreflightReport {
        suite: "preflight",
        catalogue_present: config.catalogue_path.is_file(),
        counter_present: config.counter_bin.is_file(),
        positive_examples_present: config.positive_examples.is_file(),
        negative_examples_present: config.negative_examples.is_file(),
    }
}

/// `RUST_LOG`-style directives when present and valid, `info` otherwise.
#[must_use]
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

/// The counter refuses to run with fewer than two roots of interest. Writes
/// root `0` as the positive list and root `1` as the negative list when the
/// files are missing; existing files are left alone.
pub fn write_example_lists(config: &HarnessConfig) -> Result<Vec<PathBuf>, HarnessError> {
    let mut written = Vec::new();
    for (path, root) in [
        (&config.positive_examples, "0"),
        (&config.negative_examples, "1"),
    ] {
        if path.exists() {
            continue;
        }
        ensure_parent(path)?;
        fs::write(path, format!("{root}\n"))?;
        written.push(path.clone());
    }
    Ok(written)
}

fn ensure_parent(path: &Path) -> Result<(), HarnessError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
