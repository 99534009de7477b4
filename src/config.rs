use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::controller::DEFAULT_ZOOM;
use crate::error::StoreError;
use crate::persistence::{BlobStore, FileBlobStore, SqliteBlobStore};
use crate::workout::{Coordinate, WorkoutKind};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub zoom_level: u8,
    pub storage: StorageBackend,
    /// Position used in place of geolocation
    pub home: Option<Coordinate>,
    pub default_kind: WorkoutKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zoom_level: DEFAULT_ZOOM,
            storage: StorageBackend::File,
            home: None,
            default_kind: WorkoutKind::Running,
        }
    }
}

impl Config {
    /// Opens the configured blob store, at `path` if given, else in the state dir
    pub fn open_blob_store(&self, path: Option<&Path>) -> Result<Box<dyn BlobStore>, StoreError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => AppDirs::storage_path(self.storage).unwrap_or_else(|| match self.storage {
                StorageBackend::File => PathBuf::from("mapty_workouts.json"),
                StorageBackend::Sqlite => PathBuf::from("mapty_workouts.db"),
            }),
        };
        log::debug!("using {} storage at {}", self.storage, path.display());

        Ok(match self.storage {
            StorageBackend::File => Box::new(FileBlobStore::with_path(path)),
            StorageBackend::Sqlite => Box::new(SqliteBlobStore::open(path)?),
        })
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "mapty") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("mapty_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring config {}: {}", self.path.display(), e),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
