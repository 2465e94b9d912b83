mod app;
mod backend;
mod config;
mod process;
mod render;
mod report;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use backend::{ConnectionError, FlushError};
pub use config::ConfigError;
pub use process::ProcessError;
pub use render::RenderError;
pub use report::{Grammar, ReportError};
pub use validation::ValidationError;
