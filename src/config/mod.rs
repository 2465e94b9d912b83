//! Configuration loading, application and resolution.
mod apply;
mod loader;
mod parse;
mod settings;
pub mod types;


pub use apply::apply_config;
pub use loader::load_config;
pub use settings::{OutputSettings, RunSettings};

pub(crate) use loader::DEFAULT_CONFIG_FILES;
pub(crate) use parse::parse_duration_value;
