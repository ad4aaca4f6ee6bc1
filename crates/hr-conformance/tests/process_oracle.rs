#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use hr_catalogue::{CatalogueParser, SymbolTable};
use hr_conformance::{
    HarnessConfig, HarnessError, KernelType, OracleInvoker, OracleRequest, ProcessOracle,
    TaskType, run_sweep,
};
use hr_types::DEFAULT_TYPE_COUNT;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Reports a single occurrence of whatever type the `-g` stem names.
const ECHO_COUNTER: &str = r#"
out=""
stem=""
while [ $# -gt 0 ]; do
  case "$1" in
    -s) out="$2"; shift ;;
    -g) stem="$2"; shift ;;
  esac
  shift
done
type_id=$(basename "$stem")
type_id=${type_id#example}
printf '1 %s:1 #\n' "$type_id" > "$out"
"#;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write script");
    path
}

fn shell(script: &Path) -> ProcessOracle {
    ProcessOracle::new("/bin/sh").with_leading_args([script.as_os_str().to_owned()])
}

fn request(root: &Path) -> OracleRequest {
    OracleRequest {
        type_id: 3,
        positive_examples: root.join("examples.pos"),
        negative_examples: root.join("examples.neg"),
        hypergraph_stem: root.join("example3"),
        label_stem: root.join("example3"),
        output: root.join("example3_shgk.svml"),
        kernel_type: KernelType::StandardHypergraphlet,
        task_type: TaskType::VertexClassification,
    }
}

#[test]
fn shell_counter_drives_a_green_sweep() {
    let dir = tempfile::tempdir().expect("tempdir");
    let counter = script(dir.path(), "counter.sh", ECHO_COUNTER);
    let config = HarnessConfig {
        data_dir: dir.path().join("data"),
        results_dir: dir.path().join("results"),
        samples: 3,
        allow_partial_catalogue: true,
        ..HarnessConfig::default_paths()
    };
    let symbols = SymbolTable::canonical();
    let catalogue = CatalogueParser::new(&symbols, DEFAULT_TYPE_COUNT)
        .parse_str("1:R,A\n11:R,A|R,B|R,C\n300:R,A,B,C|A,B,C|R,B\n")
        .expect("catalogue");

    let mut rng = StdRng::seed_from_u64(11);
    let report = run_sweep(&config, &catalogue, &shell(&counter), &mut rng).expect("sweep");
    assert!(report.is_green(), "{report:?}");
    assert_eq!(report.types_run, 3);
}

#[test]
fn nonzero_exit_is_captured() {
    let dir = tempfile::tempdir().expect("tempdir");
    let counter = script(dir.path(), "fail.sh", "echo oops >&2\nexit 3\n");
    let outcome = shell(&counter)
        .invoke(&request(dir.path()))
        .expect("invoke");
    assert_eq!(outcome.status, Some(3));
    assert!(!outcome.success());
    assert_eq!(outcome.stderr.trim(), "oops");
}

#[test]
fn slow_counter_is_killed_at_timeout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let counter = script(dir.path(), "slow.sh", "exec sleep 30\n");
    let oracle = shell(&counter).with_timeout(Some(Duration::from_millis(200)));

    let started = Instant::now();
    let err = oracle
        .invoke(&request(dir.path()))
        .expect_err("timed out");
    assert!(matches!(err, HarnessError::OracleTimedOut { .. }), "{err}");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn lingering_grandchild_does_not_outlive_the_timeout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let counter = script(dir.path(), "detach.sh", "sleep 30 &\necho started\nexit 0\n");
    let oracle = shell(&counter).with_timeout(Some(Duration::from_secs(1)));

    let started = Instant::now();
    let outcome = oracle
        .invoke(&request(dir.path()))
        .expect("counter itself exits");
    assert!(outcome.success());
    assert!(started.elapsed() < Duration::from_secs(10));
}
