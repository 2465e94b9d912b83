use std::path::PathBuf;

use crate::error::ProcessError;

use super::BenchSettings;

pub const WRITE_SCRIPT_NAME: &str = "kvbench-write.lua";

/// wrk workload: every request carries `key`/`value` headers, and each call
/// to `request()` emits as many requests as the depth passed after `--`.
const WRITE_SCRIPT: &str = r#"local depth = 1
local counter = 0

function init(args)
   depth = tonumber(args[1]) or 1
   if depth < 1 then
      depth = 1
   end
end

function request()
   local batch = {}
   for i = 1, depth do
      counter = counter + 1
      batch[i] = wrk.format("POST", "/", {
         ["key"] = "key:" .. counter,
         ["value"] = "value:" .. counter,
      })
   end
   return table.concat(batch)
end
"#;

/// Returns the workload script for the HTTP runs, writing the built-in one
/// under the temp path unless a script was configured.
///
/// # Errors
///
/// Returns an error when the built-in script cannot be written.
pub async fn prepare_script(settings: &BenchSettings) -> Result<PathBuf, ProcessError> {
    if let Some(script) = settings.script.as_ref() {
        return Ok(script.clone());
    }
    let path = settings.tmp_path.join(WRITE_SCRIPT_NAME);
    let write_error = |err: std::io::Error| ProcessError::WriteScript {
        path: path.display().to_string(),
        source: err,
    };
    tokio::fs::create_dir_all(&settings.tmp_path)
        .await
        .map_err(write_error)?;
    tokio::fs::write(&path, WRITE_SCRIPT)
        .await
        .map_err(write_error)?;
    Ok(path)
}
