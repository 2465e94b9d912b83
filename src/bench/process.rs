use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::ProcessError;
use crate::shutdown::{ShutdownReceiver, shutdown_requested};

/// One external load-generator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessSpec {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Stdout followed by stderr.
    #[must_use]
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            return self.stdout.clone();
        }
        let mut combined = String::with_capacity(self.stdout.len().saturating_add(self.stderr.len()));
        combined.push_str(&self.stdout);
        combined.push_str(&self.stderr);
        combined
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs the process to completion, killing it on timeout or shutdown.
    async fn run(
        &self,
        spec: &ProcessSpec,
        timeout: Duration,
        shutdown_rx: &mut ShutdownReceiver,
    ) -> Result<ProcessOutput, ProcessError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        spec: &ProcessSpec,
        timeout: Duration,
        shutdown_rx: &mut ShutdownReceiver,
    ) -> Result<ProcessOutput, ProcessError> {
        debug!(command = %spec.command_line(), ?timeout, "Spawning load generator");
        let child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ProcessError::Spawn {
                program: spec.program.clone(),
                source: err,
            })?;

        // Dropping the wait future drops the child, which kills it.
        tokio::select! {
            waited = child.wait_with_output() => {
                let output = waited.map_err(|err| ProcessError::Wait {
                    program: spec.program.clone(),
                    source: err,
                })?;
                let captured = ProcessOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                };
                if !output.status.success() {
                    return Err(ProcessError::NonZeroExit {
                        program: spec.program.clone(),
                        status: output.status.to_string(),
                        output: captured.combined(),
                    });
                }
                Ok(captured)
            }
            () = tokio::time::sleep(timeout) => Err(ProcessError::TimedOut {
                program: spec.program.clone(),
                timeout,
            }),
            () = shutdown_requested(shutdown_rx) => Err(ProcessError::Cancelled {
                program: spec.program.clone(),
            }),
        }
    }
}
