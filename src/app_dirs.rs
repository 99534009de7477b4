use directories::ProjectDirs;
use std::path::PathBuf;

use crate::config::StorageBackend;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("mapty"),
            )
        } else {
            ProjectDirs::from("", "", "mapty")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn storage_path(backend: StorageBackend) -> Option<PathBuf> {
        let file = match backend {
            StorageBackend::File => "workouts.json",
            StorageBackend::Sqlite => "workouts.db",
        };
        Self::state_dir().map(|dir| dir.join(file))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("mapty.log"))
    }
}
