use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed while waiting on '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' exited with {status}. Output:\n{output}")]
    NonZeroExit {
        program: String,
        status: String,
        output: String,
    },
    #[error("'{program}' did not finish within {timeout:?} and was killed.")]
    TimedOut { program: String, timeout: Duration },
    #[error("'{program}' was cancelled by shutdown.")]
    Cancelled { program: String },
    #[error("Failed to write workload script '{path}': {source}")]
    WriteScript {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, ProcessError::Cancelled { .. })
    }
}
