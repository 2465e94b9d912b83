use std::fmt;

use thiserror::Error;

/// Versioned report grammars understood by the parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `<percentile>% <= <latency> <unit>` blocks (redis-benchmark).
    PercentileTable,
    /// ` 50.000%    1.04ms` histogram rows (wrk2 `--latency`).
    DistributionTable,
    /// `Requests/sec: <value>` summary line (wrk / wrk2).
    RequestsPerSec,
}

impl Grammar {
    #[must_use]
    pub const fn version(self) -> u32 {
        match self {
            Grammar::PercentileTable | Grammar::DistributionTable | Grammar::RequestsPerSec => 1,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Grammar::PercentileTable => "percentile-table",
            Grammar::DistributionTable => "distribution-table",
            Grammar::RequestsPerSec => "requests-per-sec",
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/v{}", self.name(), self.version())
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{grammar}: no data block found.")]
    MissingBlock { grammar: Grammar },
    #[error("{grammar}: data block contained no usable rows.")]
    NoDataRows { grammar: Grammar },
    #[error("{grammar}: malformed row '{line}'.")]
    MalformedRow { grammar: Grammar, line: String },
    #[error("{grammar}: unknown latency unit '{unit}' in '{line}'.")]
    UnknownUnit {
        grammar: Grammar,
        unit: String,
        line: String,
    },
    #[error("{grammar}: invalid number '{value}': {source}")]
    InvalidNumber {
        grammar: Grammar,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("{grammar}: non-finite number '{value}'.")]
    NonFiniteNumber { grammar: Grammar, value: String },
    #[error("{grammar}: throughput line not found.")]
    MissingThroughput { grammar: Grammar },
}
