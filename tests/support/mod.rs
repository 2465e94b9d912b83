use std::ffi::OsStr;
use std::fs;
use std::net::TcpListener;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

pub const REDIS_BENCHMARK_SET: &str = "redis_benchmark_set.txt";
pub const WRK_PROBE: &str = "wrk_probe.txt";
pub const WRK2_LATENCY: &str = "wrk2_latency.txt";

/// Scratch directory the binary runs in, so no `kvbench.toml` is picked up.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self, String> {
        let dir = tempfile::tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes an executable shell script that prints `fixture` unless its
    /// arguments mention `failing_host`, in which case it exits with 3.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be written or made executable.
    pub fn fake_tool(&self, name: &str, fixture: &str, failing_host: Option<&str>) -> Result<PathBuf, String> {
        let fixture_path = fixture_path(fixture);
        let failure = failing_host.map_or_else(String::new, |host| {
            format!(
                "case \" $* \" in\n  *\" {} \"*) echo \"Could not connect to {}\" >&2; exit 3 ;;\nesac\n",
                host, host
            )
        });
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> \"{}\"\n{}cat \"{}\"\n",
            self.calls_path(name).display(),
            failure,
            fixture_path.display()
        );
        let path = self.path().join(name);
        fs::write(&path, script).map_err(|err| format!("write {} failed: {}", name, err))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .map_err(|err| format!("chmod {} failed: {}", name, err))?;
        Ok(path)
    }

    /// Argument lines a fake tool was invoked with, one per call.
    ///
    /// # Errors
    ///
    /// Returns an error if the call log cannot be read.
    pub fn calls(&self, name: &str) -> Result<Vec<String>, String> {
        let content = fs::read_to_string(self.calls_path(name))
            .map_err(|err| format!("read calls for {} failed: {}", name, err))?;
        Ok(content.lines().map(str::to_owned).collect())
    }

    fn calls_path(&self, name: &str) -> PathBuf {
        self.path().join(format!("{}.calls", name))
    }
}

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("src")
        .join("report")
        .join("fixtures")
        .join(name)
}

/// Picks a port that was free a moment ago.
///
/// # Errors
///
/// Returns an error if no ephemeral port can be bound.
pub fn free_port() -> Result<u16, String> {
    let listener =
        TcpListener::bind("127.0.0.1:0").map_err(|err| format!("bind probe failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("probe addr failed: {}", err))?;
    Ok(addr.port())
}

/// Runs the kvbench binary inside `workspace`.
///
/// # Errors
///
/// Returns an error if the binary cannot be started.
pub fn run_kvbench<I, S>(workspace: &Workspace, args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = kvbench_bin()?;
    Command::new(bin)
        .args(args)
        .current_dir(workspace.path())
        .env("KVBENCH_LOG", "error")
        .output()
        .map_err(|err| format!("run kvbench failed: {}", err))
}

fn kvbench_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_kvbench").map_or_else(
        || Err("CARGO_BIN_EXE_kvbench missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}

/// Reads the exported JSON document and returns its `results` array.
///
/// # Errors
///
/// Returns an error if the file is missing or not the expected shape.
pub fn exported_results(path: &Path) -> Result<Vec<serde_json::Value>, String> {
    let content = fs::read_to_string(path).map_err(|err| format!("read export failed: {}", err))?;
    let document: serde_json::Value =
        serde_json::from_str(&content).map_err(|err| format!("parse export failed: {}", err))?;
    document
        .get("results")
        .and_then(serde_json::Value::as_array)
        .cloned()
        .ok_or_else(|| "export has no results array".to_owned())
}

pub fn describe(output: &Output) -> String {
    format!(
        "status: {}\nstdout: {}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}
