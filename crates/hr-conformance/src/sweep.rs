use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use hr_catalogue::Catalogue;
use hr_instance::InstanceGenerator;
use hr_types::HypergraphletDescriptor;
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::oracle::{OracleInvoker, OracleRequest};
use crate::report::{NotFoundRecord, RegressionReport, ResultAggregator, TypeReport};
use crate::verify::{OracleResultRecord, TrialVerdict, read_result_file, verify_result};
use crate::{HarnessConfig, HarnessError, NotFoundPolicy};

pub const SUITE_NAME: &str = "hypergraphlet_regression";

enum TrialOutcome {
    Verdict {
        verdict: TrialVerdict,
        raw_line: String,
    },
    NotFound(NotFoundRecord),
}

/// Runs `config.samples` permuted trials per selected catalogue type, in
/// ascending type order. Oracle and filesystem failures abort with `Err`;
/// count failures are collected in the returned report.
pub fn run_sweep<O, R>(
    config: &HarnessConfig,
    catalogue: &Catalogue,
    oracle: &O,
    rng: &mut R,
) -> Result<RegressionReport, HarnessError>
where
    O: OracleInvoker + ?Sized,
    R: Rng + ?Sized,
{
    let (full, partial, both) = catalogue.membership().counts();
    info!(
        types = catalogue.len(),
        extended_full = full,
        extended_partial = partial,
        extended_both = both,
        "catalogue loaded"
    );

    let type_ids = select_types(config, catalogue)?;
    fs::create_dir_all(&config.results_dir)?;

    let generator = InstanceGenerator::new(config.instance_layout());
    let mut aggregator = ResultAggregator::new(SUITE_NAME, config.samples, type_ids.len());

    for type_id in type_ids {
        let descriptor = catalogue
            .get(type_id)
            .ok_or(HarnessError::UnknownType(type_id))?;
        let (tally, halt) = run_type(config, &generator, descriptor, oracle, rng)?;
        aggregator.record_type(tally);
        if let Some(record) = halt {
            aggregator.halt(record);
            break;
        }
    }

    let report = aggregator.finish();
    report.log_summary();
    Ok(report)
}

fn select_types(config: &HarnessConfig, catalogue: &Catalogue) -> Result<Vec<u32>, HarnessError> {
    match config.type_filter {
        Some(type_id) if catalogue.get(type_id).is_none() => Err(HarnessError::UnknownType(type_id)),
        Some(type_id) => Ok(vec![type_id]),
        None if config.allow_partial_catalogue => Ok(catalogue.type_ids().collect()),
        None => {
            let missing = (1..config.type_count)
                .filter(|type_id| catalogue.get(*type_id).is_none())
                .collect::<Vec<_>>();
            if !missing.is_empty() {
                return Err(HarnessError::IncompleteCatalogue {
                    type_count: config.type_count,
                    missing,
                });
            }
            Ok(catalogue.type_ids().collect())
        }
    }
}

fn run_type<O, R>(
    config: &HarnessConfig,
    generator: &InstanceGenerator,
    descriptor: &HypergraphletDescriptor,
    oracle: &O,
    rng: &mut R,
) -> Result<(TypeReport, Option<NotFoundRecord>), HarnessError>
where
    O: OracleInvoker + ?Sized,
    R: Rng + ?Sized,
{
    let type_id = descriptor.type_id();
    let mut tally = TypeReport::new(type_id, config.samples);

    for trial in 0..config.samples {
        match run_trial(config, generator, descriptor, oracle, rng, trial)? {
            TrialOutcome::Verdict {
                verdict: TrialVerdict::Pass,
                ..
            } => tally.record_pass(),
            TrialOutcome::Verdict {
                verdict: TrialVerdict::Mismatch { count },
                raw_line,
            } => {
                warn!(type_id, trial, count, line = %raw_line, "count mismatch");
                tally.record_mismatch(trial, count, raw_line);
            }
            TrialOutcome::NotFound(record) => {
                error!(type_id, trial, line = %record.raw_line, "type NOT FOUND");
                tally.record_not_found();
                return Ok(match config.not_found_policy {
                    NotFoundPolicy::AbortSweep => (tally, Some(record)),
                    NotFoundPolicy::IsolateType => (tally, None),
                });
            }
        }
    }
    Ok((tally, None))
}

fn run_trial<O, R>(
    config: &HarnessConfig,
    generator: &InstanceGenerator,
    descriptor: &HypergraphletDescriptor,
    oracle: &O,
    rng: &mut R,
    trial: usize,
) -> Result<TrialOutcome, HarnessError>
where
    O: OracleInvoker + ?Sized,
    R: Rng + ?Sized,
{
    let type_id = descriptor.type_id();
    let files = generator.generate(descriptor, rng)?;
    let output = config.result_path(type_id);
    remove_stale(&output)?;

    let request = OracleRequest {
        type_id,
        positive_examples: config.positive_examples.clone(),
        negative_examples: config.negative_examples.clone(),
        hypergraph_stem: files.stem.clone(),
        label_stem: files.stem,
        output,
        kernel_type: config.kernel_type,
        task_type: config.task_type,
    };
    let outcome = oracle.invoke(&request)?;
    debug!(
        type_id,
        trial,
        status = ?outcome.status,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "counter finished"
    );

    let record = match read_result_file(&request.output) {
        Ok(record) => record,
        Err(err) if !outcome.success() => {
            debug!(error = %err, "no usable result after counter failure");
            return Err(HarnessError::OracleCommandFailed {
                status: outcome.status.unwrap_or(-1),
                stderr: outcome.stderr,
            });
        }
        Err(err) => return Err(err),
    };
    if !outcome.success() {
        warn!(
            type_id,
            trial,
            status = ?outcome.status,
            "counter exited unsuccessfully but left a result file"
        );
    }
    classify(&record, type_id, trial, config.subgraph_test)
}

fn classify(
    record: &OracleResultRecord,
    type_id: u32,
    trial: usize,
    subgraph_test: bool,
) -> Result<TrialOutcome, HarnessError> {
    match verify_result(record, type_id, subgraph_test) {
        Ok(verdict) => Ok(TrialOutcome::Verdict {
            verdict,
            raw_line: record.raw_line.clone(),
        }),
        Err(HarnessError::TargetTypeNotFound { type_id, raw_line }) => {
            Ok(TrialOutcome::NotFound(NotFoundRecord {
                type_id,
                trial,
                raw_line,
            }))
        }
        Err(other) => Err(other),
    }
}

fn remove_stale(path: &Path) -> Result<(), HarnessError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
