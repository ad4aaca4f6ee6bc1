use std::ffi::OsString;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::HarnessError;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(25);
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Counting kernel selected with the counter's `-t` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelType {
    CumulativeRandomWalk,
    RandomWalk,
    #[default]
    StandardHypergraphlet,
    LabelMismatch,
    EdgeMismatch,
    EditDistance,
}

impl KernelType {
    pub const ALL: [Self; 6] = [
        Self::CumulativeRandomWalk,
        Self::RandomWalk,
        Self::StandardHypergraphlet,
        Self::LabelMismatch,
        Self::EdgeMismatch,
        Self::EditDistance,
    ];

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::CumulativeRandomWalk => 0,
            Self::RandomWalk => 1,
            Self::StandardHypergraphlet => 2,
            Self::LabelMismatch => 3,
            Self::EdgeMismatch => 4,
            Self::EditDistance => 5,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kernel| kernel.code() == code)
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Classification task selected with the counter's `-z` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    VertexClassification,
    EdgeClassification,
}

impl TaskType {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::VertexClassification => 0,
            Self::EdgeClassification => 1,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::VertexClassification),
            1 => Some(Self::EdgeClassification),
            _ => None,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One counter invocation for one generated instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    pub type_id: u32,
    pub positive_examples: PathBuf,
    pub negative_examples: PathBuf,
    pub hypergraph_stem: PathBuf,
    pub label_stem: PathBuf,
    pub output: PathBuf,
    pub kernel_type: KernelType,
    pub task_type: TaskType,
}

impl OracleRequest {
    /// Argument vector in the counter's flag order.
    #[must_use]
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args = Vec::with_capacity(16);
        let mut push = |flag: &str, value: OsString| {
            args.push(OsString::from(flag));
            args.push(value);
        };
        push("-p", self.positive_examples.clone().into_os_string());
        push("-n", self.negative_examples.clone().into_os_string());
        push("-g", self.hypergraph_stem.clone().into_os_string());
        push("-l", self.label_stem.clone().into_os_string());
        push("-e", self.label_stem.clone().into_os_string());
        push("-t", OsString::from(self.kernel_type.to_string()));
        push("-z", OsString::from(self.task_type.to_string()));
        push("-s", self.output.clone().into_os_string());
        args
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleOutcome {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl OracleOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    fn from_status(status: ExitStatus, stdout: String, stderr: String, elapsed: Duration) -> Self {
        Self {
            status: status.code(),
            stdout,
            stderr,
            elapsed,
        }
    }
}

/// Anything that can count hypergraphlets for a request and leave a result
/// file at `request.output`.
pub trait OracleInvoker {
    fn invoke(&self, request: &OracleRequest) -> Result<OracleOutcome, HarnessError>;
}

impl<T: OracleInvoker + ?Sized> OracleInvoker for &T {
    fn invoke(&self, request: &OracleRequest) -> Result<OracleOutcome, HarnessError> {
        (**self).invoke(request)
    }
}

/// Runs the external counter binary as a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOracle {
    program: PathBuf,
    leading_args: Vec<OsString>,
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl ProcessOracle {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Arguments placed before the counter flags, for wrappers such as an
    /// interpreter or `valgrind`.
    #[must_use]
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn wait_with_deadline(
        &self,
        child: &mut std::process::Child,
        started: Instant,
    ) -> Result<ExitStatus, HarnessError> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait()?);
        };
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if started.elapsed() >= limit {
                let _ = child.kill();
                let _ = child.wait();
                warn!(
                    program = %self.program.display(),
                    timeout_ms = limit.as_millis() as u64,
                    "counter killed after timeout"
                );
                return Err(HarnessError::OracleTimedOut {
                    program: self.program.clone(),
                    timeout: limit,
                });
            }
            thread::sleep(self.poll_interval.min(limit));
        }
    }

    fn collect(&self, handle: Option<JoinHandle<String>>, deadline: Option<Instant>) -> String {
        let Some(handle) = handle else {
            return String::new();
        };
        if let Some(deadline) = deadline {
            while !handle.is_finished() {
                if Instant::now() >= deadline {
                    warn!(
                        program = %self.program.display(),
                        "counter output still open after exit, not waiting for it"
                    );
                    return String::new();
                }
                thread::sleep(self.poll_interval);
            }
        }
        handle.join().unwrap_or_default()
    }
}

impl OracleInvoker for ProcessOracle {
    fn invoke(&self, request: &OracleRequest) -> Result<OracleOutcome, HarnessError> {
        let started = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(request.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::OracleSpawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let status = self.wait_with_deadline(&mut child, started)?;

        // A grandchild can keep the pipes open after the counter exits.
        let drain_deadline = self
            .timeout
            .map(|limit| (started + limit).max(Instant::now() + DRAIN_GRACE));
        Ok(OracleOutcome::from_status(
            status,
            self.collect(stdout, drain_deadline),
            self.collect(stderr, drain_deadline),
            started.elapsed(),
        ))
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}


#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::path::PathBuf;

    use super::{KernelType, OracleRequest, ProcessOracle, TaskType};
    use crate::{HarnessError, OracleInvoker};

    fn request() -> OracleRequest {
        OracleRequest {
            type_id: 57,
            positive_examples: PathBuf::from("examples.pos"),
            negative_examples: PathBuf::from("examples.neg"),
            hypergraph_stem: PathBuf::from("./data/example57"),
            label_stem: PathBuf::from("./data/example57"),
            output: PathBuf::from("./results/example57_shgk.svml"),
            kernel_type: KernelType::StandardHypergraphlet,
            task_type: TaskType::VertexClassification,
        }
    }

    #[test]
    fn args_follow_counter_flag_order() {
        let args = request().to_args();
        let expected = [
            "-p",
            "examples.pos",
            "-n",
            "examples.neg",
            "-g",
            "./data/example57",
            "-l",
            "./data/example57",
            "-e",
            "./data/example57",
            "-t",
            "2",
            "-z",
            "0",
            "-s",
            "./results/example57_shgk.svml",
        ]
        .map(OsString::from);
        assert_eq!(args, expected);
    }

    #[test]
    fn kernel_and_task_codes_round_trip() {
        for kernel in KernelType::ALL {
            assert_eq!(KernelType::from_code(kernel.code()), Some(kernel));
        }
        assert_eq!(KernelType::from_code(6), None);
        assert_eq!(TaskType::from_code(1), Some(TaskType::EdgeClassification));
        assert_eq!(TaskType::from_code(2), None);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let oracle = ProcessOracle::new(dir.path().join("no-such-counter"));
        let err = oracle.invoke(&request()).expect_err("spawn fails");
        assert!(matches!(err, HarnessError::OracleSpawn { .. }), "{err}");
    }
}
