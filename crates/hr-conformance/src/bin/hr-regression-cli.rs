#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use hr_conformance::{
    HarnessConfig, KernelType, NotFoundPolicy, TaskType, log_filter, run_preflight, run_sweep,
    write_example_lists,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Stop the sweep at the first trial missing its own type.
    Abort,
    /// Fail that type and continue with the next one.
    Isolate,
}

impl From<PolicyArg> for NotFoundPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Abort => Self::AbortSweep,
            PolicyArg::Isolate => Self::IsolateType,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "hr-regression-cli")]
#[command(about = "Hypergraphlet counter regression sweep")]
struct Args {
    /// Catalogue of `typeId:hyperedge|hyperedge...` lines.
    #[arg(long, default_value = "hypergraphlets_description.txt")]
    catalogue: PathBuf,
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,
    /// Counter executable.
    #[arg(long, default_value = "./run_hyperkernel")]
    counter: PathBuf,
    #[arg(long, default_value = "examples.pos")]
    positive: PathBuf,
    #[arg(long, default_value = "examples.neg")]
    negative: PathBuf,
    #[arg(long, default_value = "example")]
    case_name: String,
    /// Permuted trials per type.
    #[arg(long, default_value_t = hr_conformance::DEFAULT_SAMPLES as u64, value_parser = clap::value_parser!(u64).range(1..))]
    samples: u64,
    /// Only sweep this type.
    #[arg(long)]
    type_id: Option<u32>,
    /// Counter `-t` code (0-5).
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=5))]
    kernel_type: u8,
    /// Counter `-z` code (0 vertex, 1 hyperedge).
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    task_type: u8,
    /// Accept any count for the target type as long as it is present.
    #[arg(long)]
    subgraph_test: bool,
    #[arg(long, value_enum, default_value = "abort")]
    not_found_policy: PolicyArg,
    /// Sweep only the types the catalogue lists instead of requiring 1..472.
    #[arg(long)]
    allow_partial_catalogue: bool,
    /// Kill a counter run after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Seed for the permutation RNG.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    report_json: Option<PathBuf>,
    /// Create missing example root lists before sweeping.
    #[arg(long)]
    write_example_lists: bool,
}

impl Args {
    fn to_config(&self) -> Result<HarnessConfig, Box<dyn std::error::Error>> {
        let kernel_type = KernelType::from_code(self.kernel_type)
            .ok_or_else(|| format!("unsupported kernel type: {}", self.kernel_type))?;
        let task_type = TaskType::from_code(self.task_type)
            .ok_or_else(|| format!("unsupported task type: {}", self.task_type))?;
        Ok(HarnessConfig {
            catalogue_path: self.catalogue.clone(),
            data_dir: self.data_dir.clone(),
            results_dir: self.results_dir.clone(),
            case_name: self.case_name.clone(),
            counter_bin: self.counter.clone(),
            positive_examples: self.positive.clone(),
            negative_examples: self.negative.clone(),
            samples: usize::try_from(self.samples)?,
            kernel_type,
            task_type,
            subgraph_test: self.subgraph_test,
            not_found_policy: self.not_found_policy.into(),
            allow_partial_catalogue: self.allow_partial_catalogue,
            oracle_timeout: self.timeout_secs.map(Duration::from_secs),
            type_filter: self.type_id,
            seed: self.seed,
            ..HarnessConfig::default_paths()
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .init();

    let args = Args::parse();
    let config = args.to_config()?;

    if args.write_example_lists {
        for path in write_example_lists(&config)? {
            info!(path = %path.display(), "wrote example root list");
        }
    }

    let preflight = run_preflight(&config);
    if !preflight.positive_examples_present || !preflight.negative_examples_present {
        warn!("example root lists missing; the counter needs at least two roots (see --write-example-lists)");
    }
    if !preflight.counter_present {
        warn!(counter = %config.counter_bin.display(), "counter not found as a file; relying on PATH lookup");
    }

    let catalogue = config.load_catalogue()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let oracle = config.process_oracle();
    let report = run_sweep(&config, &catalogue, &oracle, &mut rng)?;

    println!(
        "suite={} types={}/{} failed_types={} not_found={} green={}",
        report.suite,
        report.types_run,
        report.types_planned,
        report.failed_types,
        report.not_found,
        report.is_green()
    );

    if let Some(path) = &args.report_json {
        report.write_json(path)?;
        info!(path = %path.display(), "wrote regression report");
    }

    if let Some(halted) = &report.halted {
        return Err(format!(
            "sweep halted: type {} NOT FOUND on trial {}: {}",
            halted.type_id, halted.trial, halted.raw_line
        )
        .into());
    }
    if !report.is_green() {
        return Err(format!("failed types: {:?}", report.failed_type_ids()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use hr_conformance::NotFoundPolicy;

    use super::Args;

    #[test]
    fn zero_samples_are_rejected() {
        assert!(Args::try_parse_from(["hr-regression-cli", "--samples", "0"]).is_err());
        let args = Args::try_parse_from(["hr-regression-cli", "--samples", "3"]).expect("parse");
        assert_eq!(args.to_config().expect("config").samples, 3);
    }

    #[test]
    fn defaults_require_a_complete_catalogue() {
        let config = Args::try_parse_from(["hr-regression-cli"])
            .expect("parse")
            .to_config()
            .expect("config");
        assert_eq!(config.samples, 50);
        assert!(!config.allow_partial_catalogue);
        assert_eq!(config.not_found_policy, NotFoundPolicy::AbortSweep);

        let config = Args::try_parse_from([
            "hr-regression-cli",
            "--allow-partial-catalogue",
            "--not-found-policy",
            "isolate",
        ])
        .expect("parse")
        .to_config()
        .expect("config");
        assert!(config.allow_partial_catalogue);
        assert_eq!(config.not_found_policy, NotFoundPolicy::IsolateType);
    }
}
