use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "shakaquest";

/// Where the progress database and log file live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    state_dir: PathBuf,
}

impl AppDirs {
    /// Use `dir` as-is, e.g. from `--data-dir`
    pub fn at<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            state_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The override if given, otherwise the platform state directory
    pub fn resolve(override_dir: Option<&Path>) -> Option<Self> {
        match override_dir {
            Some(dir) => Some(Self::at(dir)),
            None => default_state_dir().map(Self::at),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.state_dir.join("progress.db")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join(format!("{APP_NAME}.log"))
    }
}

fn default_state_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        Some(
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME),
        )
    } else {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_local_dir().to_path_buf())
    }
}
