//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use cli::BenchArgs;
pub use types::{LoadTool, PositiveU64, PositiveUsize};
