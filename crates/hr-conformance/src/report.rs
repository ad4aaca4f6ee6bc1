use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::HarnessError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MismatchRecord {
    pub trial: usize,
    pub count: f64,
    pub raw_line: String,
}

/// The trial whose result lacked its own type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotFoundRecord {
    pub type_id: u32,
    pub trial: usize,
    pub raw_line: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeReport {
    pub type_id: u32,
    pub samples: usize,
    pub trials_run: usize,
    pub passed: usize,
    pub failed: usize,
    pub not_found: usize,
    pub mismatches: Vec<MismatchRecord>,
}

impl TypeReport {
    #[must_use]
    pub fn new(type_id: u32, samples: usize) -> Self {
        Self {
            type_id,
            samples,
            trials_run: 0,
            passed: 0,
            failed: 0,
            not_found: 0,
            mismatches: Vec::new(),
        }
    }

    pub fn record_pass(&mut self) {
        self.trials_run += 1;
        self.passed += 1;
    }

    pub fn record_mismatch(&mut self, trial: usize, count: f64, raw_line: String) {
        self.trials_run += 1;
        self.failed += 1;
        self.mismatches.push(MismatchRecord {
            trial,
            count,
            raw_line,
        });
    }

    pub fn record_not_found(&mut self) {
        self.trials_run += 1;
        self.failed += 1;
        self.not_found += 1;
    }

    /// At least one trial ran, none failed, and none were skipped.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.trials_run > 0 && self.failed == 0 && self.trials_run == self.samples
    }

    /// Failed trials as a share of the planned sample count.
    #[must_use]
    pub fn failure_percent(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.failed as f64 / self.samples as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub suite: String,
    pub samples_per_type: usize,
    pub types_planned: usize,
    pub types_run: usize,
    pub failed_types: usize,
    pub not_found: usize,
    pub halted: Option<NotFoundRecord>,
    pub types: Vec<TypeReport>,
}

impl RegressionReport {
    #[must_use]
    pub fn is_green(&self) -> bool {
        self.failed_types == 0 && self.halted.is_none() && self.types_run > 0
    }

    #[must_use]
    pub fn failed_type_ids(&self) -> Vec<u32> {
        self.types
            .iter()
            .filter(|report| !report.is_passed())
            .map(|report| report.type_id)
            .collect()
    }

    pub fn write_json(&self, path: &Path) -> Result<(), HarnessError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn log_summary(&self) {
        if let Some(halted) = &self.halted {
            error!(
                type_id = halted.type_id,
                trial = halted.trial,
                "sweep halted: type not found in counter output"
            );
        }
        info!(
            suite = %self.suite,
            types_run = self.types_run,
            types_planned = self.types_planned,
            failed_types = self.failed_types,
            not_found = self.not_found,
            green = self.is_green(),
            "regression summary"
        );
    }
}

/// Folds per-type outcomes into a [`RegressionReport`].
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    suite: String,
    samples: usize,
    types_planned: usize,
    failed_types: usize,
    not_found: usize,
    halted: Option<NotFoundRecord>,
    types: Vec<TypeReport>,
}

impl ResultAggregator {
    #[must_use]
    pub fn new(suite: impl Into<String>, samples: usize, types_planned: usize) -> Self {
        Self {
            suite: suite.into(),
            samples,
            types_planned,
            failed_types: 0,
            not_found: 0,
            halted: None,
            types: Vec::new(),
        }
    }

    pub fn record_type(&mut self, report: TypeReport) {
        if report.is_passed() {
            info!(
                type_id = report.type_id,
                samples = report.trials_run,
                "type PASSED on {} different inputs",
                report.trials_run
            );
        } else {
            self.failed_types += 1;
            warn!(
                type_id = report.type_id,
                failed = report.failed,
                "type FAILED on {:.1}% of inputs",
                report.failure_percent()
            );
        }
        self.not_found += report.not_found;
        self.types.push(report);
    }

    pub fn halt(&mut self, record: NotFoundRecord) {
        self.halted = Some(record);
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    #[must_use]
    pub fn finish(self) -> RegressionReport {
        RegressionReport {
            suite: self.suite,
            samples_per_type: self.samples,
            types_planned: self.types_planned,
            types_run: self.types.len(),
            failed_types: self.failed_types,
            not_found: self.not_found,
            halted: self.halted,
            types: self.types,
        }
    }
}
