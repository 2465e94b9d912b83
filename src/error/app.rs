use thiserror::Error;

use super::{
    ConfigError, ConnectionError, FlushError, ProcessError, RenderError, ReportError,
    ValidationError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("Join error: {source}")]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Backend connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Pipeline flush error: {0}")]
    Flush(#[from] FlushError),
    #[error("Report parse error: {0}")]
    Report(#[from] ReportError),
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation<E>(error: E) -> Self
    where
        E: Into<ValidationError>,
    {
        error.into().into()
    }

    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }

    pub fn connection<E>(error: E) -> Self
    where
        E: Into<ConnectionError>,
    {
        error.into().into()
    }

    pub fn report<E>(error: E) -> Self
    where
        E: Into<ReportError>,
    {
        error.into().into()
    }

    pub fn process<E>(error: E) -> Self
    where
        E: Into<ProcessError>,
    {
        error.into().into()
    }

    pub fn render<E>(error: E) -> Self
    where
        E: Into<RenderError>,
    {
        error.into().into()
    }

    /// Target-scoped errors are skipped by the orchestrator; anything else
    /// belongs to the run as a whole.
    #[must_use]
    pub const fn is_target_scoped(&self) -> bool {
        matches!(
            self,
            AppError::Report(_) | AppError::Process(_) | AppError::Connection(_)
        )
    }

    /// True when an external process was killed because of shutdown.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Process(err) if err.is_cancelled())
    }
}
