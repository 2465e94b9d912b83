use std::path::PathBuf;

pub(crate) const DEFAULT_IMAGE: &str = "results.png";

pub(crate) fn default_tmp_path() -> String {
    default_base_dir()
        .join("tmp")
        .to_string_lossy()
        .into_owned()
}

fn default_base_dir() -> PathBuf {
    if let Some(home) = user_home_dir() {
        return home.join(".kvbench");
    }

    PathBuf::from(".kvbench")
}

fn user_home_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        if let Some(value) = std::env::var_os("USERPROFILE") {
            return Some(PathBuf::from(value));
        }
    }

    std::env::var_os("HOME").map(PathBuf::from)
}
