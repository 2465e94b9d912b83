//! Comparative latency benchmarks for key-value backends.
//!
//! Each target gets an HTTP bridge that turns `key`/`value` requests into
//! pipelined `SET` commands over a bounded connection pool. The
//! orchestrator drives external load generators against the bridges (or
//! the backends directly) one target at a time, parses their reports and
//! aggregates the results into a comparison chart.
pub mod args;
pub mod backend;
pub mod bench;
pub mod bridge;
pub mod charts;
pub mod config;
pub mod entry;
pub mod error;
pub mod logger;
pub mod report;
pub mod results;
pub mod shutdown;
