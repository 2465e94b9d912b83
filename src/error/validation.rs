use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No benchmark targets configured (set --hosts or [[targets]] in config).")]
    MissingTargets,
    #[error("Invalid host entry '{value}'. Expected 'host:port' or 'name:host:port'.")]
    InvalidHostEntry { value: String },
    #[error("Invalid port in host entry '{value}': {source}")]
    InvalidHostPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Bridge port for target #{index} overflows past 65535 (base port {base_port}).")]
    BridgePortOverflow { base_port: u16, index: usize },
    #[error("Bridge port {port} is assigned to more than one target.")]
    DuplicateBridgePort { port: u16 },
    #[error("No bridge registered for port {port}.")]
    UnknownBridgePort { port: u16 },
    #[error("Failed to bind bridge listener on {addr}: {source}")]
    BindBridge {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid bind address '{value}': {source}")]
    InvalidBindAddress {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("Invalid bridge URL '{url}': {source}")]
    InvalidBridgeUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'. Use a number with an optional ms/s/m/h suffix.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
