use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::collection::Collection;
use crate::error::StoreError;
use crate::workout::Workout;

/// Key under which the workout list is stored
pub const WORKOUTS_KEY: &str = "workouts";

/// String-keyed blob storage, the terminal counterpart of browser localStorage
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    /// Drop every key
    fn clear(&mut self) -> Result<(), StoreError>;
}

impl<T: BlobStore + ?Sized> BlobStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.blobs.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.blobs.clear();
        Ok(())
    }
}

/// All blobs in one JSON object on disk
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Where an unreadable blob file is moved before it is replaced
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".corrupt");
        PathBuf::from(name)
    }

    /// Writes a sibling temp file and renames it over the blob file, so a
    /// crash mid-save leaves the previous contents in place.
    fn write_all(&self, blobs: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let data = serde_json::to_vec_pretty(blobs)?;
        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Current contents. An unreadable file is set aside, not overwritten.
    fn read_for_update(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match self.read_all() {
            Err(StoreError::Json(e)) => {
                let aside = self.corrupt_path();
                log::warn!(
                    "blob file {} is corrupt ({}), moved to {} and starting fresh",
                    self.path.display(),
                    e,
                    aside.display()
                );
                fs::rename(&self.path, &aside)?;
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut blobs = self.read_for_update()?;
        blobs.insert(key.to_string(), value.to_string());
        self.write_all(&blobs)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let mut blobs = self.read_for_update()?;
        if blobs.remove(key).is_some() {
            self.write_all(&blobs)?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Blobs in a single SQLite table
#[derive(Debug)]
pub struct SqliteBlobStore {
    conn: Connection,
}

impl SqliteBlobStore {
    /// Open (or create) the database file and its table
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(SqliteBlobStore { conn })
    }
}

impl BlobStore for SqliteBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM blobs WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO blobs (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM blobs WHERE key = ?1", [key])?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM blobs", [])?;
        Ok(())
    }
}

/// Moves the workout collection in and out of a blob store
#[derive(Debug)]
pub struct PersistenceBridge<B> {
    store: B,
}

impl<B: BlobStore> PersistenceBridge<B> {
    pub fn new(store: B) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn save<H>(&mut self, collection: &Collection<H>) -> Result<(), StoreError> {
        let blob = serde_json::to_string(&collection.to_serializable())?;
        self.store.set(WORKOUTS_KEY, &blob)
    }

    /// Reads the saved collection, rebuilding markers through `place`.
    /// Missing or unreadable data loads as an empty collection.
    pub fn load<H, F>(&self, place: F) -> Collection<H>
    where
        F: FnMut(&Workout) -> H,
    {
        let blob = match self.store.get(WORKOUTS_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Collection::new(),
            Err(e) => {
                log::warn!("could not read saved workouts: {e}");
                return Collection::new();
            }
        };

        match serde_json::from_str::<serde_json::Value>(&blob) {
            Ok(data) => Collection::from_serializable(Some(&data), place),
            Err(e) => {
                log::warn!("saved workouts are not valid JSON: {e}");
                Collection::new()
            }
        }
    }

    /// Wipes the whole blob store
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.store.clear()
    }
}
