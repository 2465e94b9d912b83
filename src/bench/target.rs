use serde::Serialize;

use crate::error::ValidationError;

/// A configured benchmark target. Identity is the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub name: String,
    pub host: String,
    pub backend_port: u16,
    pub bridge_port: u16,
}

/// A target before its bridge port is allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl TargetSpec {
    /// Parses `host:port` or `name:host:port`. Without an explicit name the
    /// target is called `"<host> <port>"`.
    ///
    /// # Errors
    ///
    /// Returns an error for any other shape, an empty host, or a bad port.
    pub fn parse(entry: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidHostEntry {
            value: entry.to_owned(),
        };
        let parts: Vec<&str> = entry.trim().split(':').map(str::trim).collect();
        let (name, host, port) = match parts.as_slice() {
            [host, port] => (None, *host, *port),
            [name, host, port] => (Some(*name), *host, *port),
            _ => return Err(invalid()),
        };
        if host.is_empty() || name.is_some_and(str::is_empty) {
            return Err(invalid());
        }
        let port: u16 = port
            .parse()
            .map_err(|err| ValidationError::InvalidHostPort {
                value: entry.to_owned(),
                source: err,
            })?;
        let name = name.map_or_else(|| format!("{} {}", host, port), str::to_owned);
        Ok(Self {
            name,
            host: host.to_owned(),
            port,
        })
    }
}

/// Assigns bridge ports sequentially from `base_port`, in listing order.
///
/// # Errors
///
/// Returns an error when the list is empty or a port would pass 65535.
pub fn assign_bridge_ports(
    specs: Vec<TargetSpec>,
    base_port: u16,
) -> Result<Vec<Target>, ValidationError> {
    if specs.is_empty() {
        return Err(ValidationError::MissingTargets);
    }
    specs
        .into_iter()
        .enumerate()
        .map(|(index, spec)| {
            let bridge_port = u16::try_from(index)
                .ok()
                .and_then(|offset| base_port.checked_add(offset))
                .ok_or(ValidationError::BridgePortOverflow { base_port, index })?;
            Ok(Target {
                name: spec.name,
                host: spec.host,
                backend_port: spec.port,
                bridge_port,
            })
        })
        .collect()
}
