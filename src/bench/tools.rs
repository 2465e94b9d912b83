use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::error::ValidationError;

use super::process::ProcessSpec;
use super::{BenchSettings, Target};

/// `redis-benchmark` SET run straight against the target backend.
#[must_use]
pub fn redis_benchmark_spec(settings: &BenchSettings, target: &Target) -> ProcessSpec {
    ProcessSpec::new(settings.binaries.redis_benchmark.as_str())
        .arg("-h")
        .arg(target.host.as_str())
        .arg("-p")
        .arg(target.backend_port.to_string())
        .arg("-t")
        .arg("set")
        .arg("-n")
        .arg(settings.requests.to_string())
        .arg("-c")
        .arg(settings.connections.to_string())
        .arg("-P")
        .arg(settings.pipelined.to_string())
}

/// wrk/wrk2 invocation against a bridge. `rate` is only passed for the
/// fixed-rate latency run.
#[must_use]
pub fn wrk_spec(
    program: &str,
    settings: &BenchSettings,
    script: &Path,
    duration: Duration,
    rate: Option<u64>,
    url: &Url,
) -> ProcessSpec {
    let mut spec = ProcessSpec::new(program)
        .arg("--latency")
        .arg("--script")
        .arg(script.to_string_lossy())
        .arg("--threads")
        .arg(settings.threads.to_string())
        .arg("--connections")
        .arg(settings.connections.to_string())
        .arg("--duration")
        .arg(format!("{}s", duration.as_secs().max(1)));
    if let Some(rate) = rate {
        spec = spec.arg("--rate").arg(rate.to_string());
    }
    spec.arg(url.as_str())
        .arg("--")
        .arg(settings.pipelined.to_string())
}

/// URL a local load generator uses to reach a bridge. Wildcard listeners
/// are reached through loopback.
///
/// # Errors
///
/// Returns an error when the address does not form a valid URL.
pub fn bridge_url(addr: SocketAddr) -> Result<Url, ValidationError> {
    let host = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip @ (IpAddr::V4(_) | IpAddr::V6(_)) => ip,
    };
    let raw = format!("http://{}/", SocketAddr::new(host, addr.port()));
    Url::parse(&raw).map_err(|err| ValidationError::InvalidBridgeUrl {
        url: raw,
        source: err,
    })
}

/// Fixed request rate for the latency run, derived from probe throughput.
#[must_use]
pub fn latency_rate(throughput_ops_per_sec: f64) -> u64 {
    if !throughput_ops_per_sec.is_finite() || throughput_ops_per_sec < 1.0 {
        return 1;
    }
    // Saturating float-to-int conversion.
    let rate = throughput_ops_per_sec.round() as u64;
    rate.max(1)
}
