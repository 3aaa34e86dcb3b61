pub mod locate;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::GatewayError;

pub use locate::{candidate_paths, find_tool, validate_tool_path};

/// How often the running subprocess is checked for exit, timeout and
/// cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Stdout lines in this form are collected into the measurement payload.
const MEASURE_PREFIX: &str = "MEASURE:";

/// Spawns the external image-processing application with a generated macro
/// file. One invocation at a time; the macro temp file is removed after the
/// run regardless of outcome.
pub struct ToolGateway {
    executable: PathBuf,
    timeout: Duration,
    extra_args: Vec<String>,
}

#[derive(Debug)]
pub struct ToolOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Key/value pairs the macro printed in the recognized form.
    pub measurements: IndexMap<String, String>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl ToolGateway {
    pub fn new<P: AsRef<Path>>(executable: P, timeout: Duration) -> Result<Self, GatewayError> {
        let executable = executable.as_ref().to_path_buf();
        if !validate_tool_path(&executable) {
            return Err(GatewayError::InvalidExecutable(executable));
        }

        Ok(Self {
            executable,
            timeout,
            extra_args: Vec::new(),
        })
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Runs one macro to completion, polling for timeout and cancellation.
    ///
    /// Output is captured through temp files rather than pipes so a chatty
    /// tool cannot fill a pipe buffer and stall while we only poll
    /// `try_wait`.
    pub fn run_macro(
        &self,
        macro_text: &str,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, GatewayError> {
        let mut macro_file = tempfile::Builder::new()
            .prefix("fijibatch_")
            .suffix(".ijm")
            .tempfile()
            .map_err(GatewayError::MacroFile)?;
        macro_file
            .write_all(macro_text.as_bytes())
            .map_err(GatewayError::MacroFile)?;
        macro_file.flush().map_err(GatewayError::MacroFile)?;

        let stdout_capture = tempfile::tempfile().map_err(GatewayError::Capture)?;
        let stderr_capture = tempfile::tempfile().map_err(GatewayError::Capture)?;

        let mut child = Command::new(&self.executable)
            .arg("-macro")
            .arg(macro_file.path())
            .args(&self.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(
                stdout_capture.try_clone().map_err(GatewayError::Capture)?,
            ))
            .stderr(Stdio::from(
                stderr_capture.try_clone().map_err(GatewayError::Capture)?,
            ))
            .spawn()
            .map_err(|e| GatewayError::Spawn {
                executable: self.executable.clone(),
                source: e,
            })?;

        debug!(
            "Started {} -macro {}",
            self.executable.display(),
            macro_file.path().display()
        );

        let started = Instant::now();
        let status = loop {
            match child.try_wait().map_err(GatewayError::Wait)? {
                Some(status) => break status,
                None => {
                    if cancel.is_cancelled() {
                        terminate(&mut child);
                        return Err(GatewayError::Cancelled);
                    }
                    if started.elapsed() >= self.timeout {
                        terminate(&mut child);
                        return Err(GatewayError::Timeout {
                            seconds: self.timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        };

        let stdout = read_capture(stdout_capture)?;
        let stderr = read_capture(stderr_capture)?;
        let measurements = parse_measurements(&stdout);

        if !stderr.is_empty() {
            warn!("Tool stderr: {}", stderr.trim_end());
        }

        Ok(ToolOutput {
            exit_code: status.code(),
            stdout,
            stderr,
            measurements,
        })
    }
}

fn terminate(child: &mut std::process::Child) {
    if let Err(e) = child.kill() {
        warn!("Failed to kill tool process: {}", e);
    }
    let _ = child.wait();
}

fn read_capture(mut file: File) -> Result<String, GatewayError> {
    file.seek(SeekFrom::Start(0)).map_err(GatewayError::Capture)?;
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(GatewayError::Capture)?;
    Ok(text)
}

/// Extracts `MEASURE:key=value` lines. Anything else the tool prints is
/// treated as opaque.
fn parse_measurements(stdout: &str) -> IndexMap<String, String> {
    let mut measurements = IndexMap::new();

    for line in stdout.lines() {
        let Some(rest) = line.trim().strip_prefix(MEASURE_PREFIX) else {
            continue;
        };
        if let Some((key, value)) = rest.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                measurements.insert(key.to_string(), value.trim().to_string());
            }
        }
    }

    measurements
}
