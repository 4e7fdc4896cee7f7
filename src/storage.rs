// Key-value storage backends

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// String-keyed storage of string values, modelled on browser local storage
pub trait Storage {
    /// Read the value stored under `key`, if any
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

/// Which storage backend to open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    File,
    Memory,
}

/// Open the configured backend rooted at `path`
pub fn open_storage(backend: Backend, path: &Path) -> Result<Box<dyn Storage>> {
    debug!(?backend, ?path, "open_storage: called");
    let storage: Box<dyn Storage> = match backend {
        Backend::Sqlite => Box::new(SqliteStorage::open(path)?),
        Backend::File => Box::new(FileStorage::open(path)?),
        Backend::Memory => Box::new(MemoryStorage::default()),
    };
    Ok(storage)
}

// ============================================================================
// In-memory
// ============================================================================

/// Non-persistent storage; contents vanish with the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

// ============================================================================
// SQLite
// ============================================================================

/// Storage backed by a single SQLite table
pub struct SqliteStorage {
    db: Connection,
}

impl SqliteStorage {
    /// Open or create `tasklist.db` inside the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref();
        fs::create_dir_all(base_path).context("Failed to create store directory")?;

        let db_path = base_path.join("tasklist.db");
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let storage = Self { db };
        storage.create_schema()?;
        Ok(storage)
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating storage schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM storage WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("Failed to read storage item")?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.db
            .execute(
                "INSERT OR REPLACE INTO storage (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, crate::now_ms()],
            )
            .context("Failed to write storage item")?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.db
            .execute("DELETE FROM storage WHERE key = ?1", [key])
            .context("Failed to remove storage item")?;
        Ok(())
    }
}

// ============================================================================
// Plain files
// ============================================================================

/// Storage keeping one `{key}.json` file per key
///
/// Writes go to a temporary file that is renamed over the item, so readers
/// see either the old value or the new one. A `.{key}.lock` file serialises
/// access across processes.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        Ok(Self { base_path })
    }

    fn item_path(&self, key: &str) -> Result<PathBuf> {
        Self::validate_key(key)?;
        Ok(self.base_path.join(format!("{}.json", key)))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!(".{}.json.tmp", key))
    }

    fn lock(&self, key: &str) -> Result<fs::File> {
        let path = self.base_path.join(format!(".{}.lock", key));
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .context("Failed to open lock file")
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(eyre!("Storage key cannot be empty"));
        }
        if key.len() > 64 {
            return Err(eyre!("Storage key too long: {} (max 64 chars)", key));
        }
        if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
            return Err(eyre!("Invalid storage key: {} (must be alphanumeric with _/-)", key));
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key)?;
        let lock = self.lock(key)?;
        lock.lock_shared().context("Failed to acquire file lock")?;

        if !path.exists() {
            return Ok(None);
        }

        let mut content = String::new();
        fs::File::open(&path)
            .context("Failed to open storage file")?
            .read_to_string(&mut content)
            .context("Failed to read storage file")?;
        Ok(Some(content))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.item_path(key)?;
        let lock = self.lock(key)?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        let temp_path = self.temp_path(key);
        let mut file = fs::File::create(&temp_path).context("Failed to create temporary storage file")?;
        file.write_all(value.as_bytes())
            .context("Failed to write temporary storage file")?;
        file.sync_all().context("Failed to sync temporary storage file")?;
        drop(file);

        fs::rename(&temp_path, &path).context("Failed to replace storage file")?;
        debug!(key, bytes = value.len(), "FileStorage: item written");
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        let path = self.item_path(key)?;
        let lock = self.lock(key)?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        if path.exists() {
            fs::remove_file(&path).context("Failed to remove storage file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(storage: &mut dyn Storage) {
        assert_eq!(storage.get_item("todoTasks").unwrap(), None);

        storage.set_item("todoTasks", "[1]").unwrap();
        assert_eq!(storage.get_item("todoTasks").unwrap().as_deref(), Some("[1]"));

        // Shorter value must fully replace the longer one
        storage.set_item("todoTasks", "[12345]").unwrap();
        storage.set_item("todoTasks", "[]").unwrap();
        assert_eq!(storage.get_item("todoTasks").unwrap().as_deref(), Some("[]"));

        storage.remove_item("todoTasks").unwrap();
        assert_eq!(storage.get_item("todoTasks").unwrap(), None);

        // Removing again is fine
        storage.remove_item("todoTasks").unwrap();
    }

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::default();
        exercise(&mut storage);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_sqlite_storage() {
        let temp = TempDir::new().unwrap();
        let mut storage = SqliteStorage::open(temp.path()).unwrap();
        exercise(&mut storage);
        assert!(temp.path().join("tasklist.db").exists());
    }

    #[test]
    fn test_sqlite_storage_persists_across_open() {
        let temp = TempDir::new().unwrap();
        {
            let mut storage = SqliteStorage::open(temp.path()).unwrap();
            storage.set_item("todoTasks", "[\"kept\"]").unwrap();
        }
        let storage = SqliteStorage::open(temp.path()).unwrap();
        assert_eq!(storage.get_item("todoTasks").unwrap().as_deref(), Some("[\"kept\"]"));
    }

    #[test]
    fn test_file_storage() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();
        exercise(&mut storage);
    }

    #[test]
    fn test_file_storage_writes_key_file() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();
        storage.set_item("todoTasks", "[]").unwrap();

        let content = fs::read_to_string(temp.path().join("todoTasks.json")).unwrap();
        assert_eq!(content, "[]");
    }

    #[test]
    fn test_file_storage_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();
        storage.set_item("todoTasks", "[1]").unwrap();
        storage.set_item("todoTasks", "[]").unwrap();

        assert!(!temp.path().join(".todoTasks.json.tmp").exists());
        assert_eq!(fs::read_to_string(temp.path().join("todoTasks.json")).unwrap(), "[]");
    }

    #[test]
    fn test_file_storage_ignores_interrupted_write() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();
        storage.set_item("todoTasks", "[\"old\"]").unwrap();

        // A crash mid-write leaves only a partial temp file behind
        fs::write(temp.path().join(".todoTasks.json.tmp"), "[\"ne").unwrap();
        assert_eq!(storage.get_item("todoTasks").unwrap().as_deref(), Some("[\"old\"]"));

        storage.set_item("todoTasks", "[\"new\"]").unwrap();
        assert_eq!(storage.get_item("todoTasks").unwrap().as_deref(), Some("[\"new\"]"));
        assert!(!temp.path().join(".todoTasks.json.tmp").exists());
    }

    #[test]
    fn test_file_storage_rejects_bad_keys() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        assert!(storage.set_item("", "x").is_err());
        assert!(storage.set_item("../escape", "x").is_err());
        assert!(storage.get_item(&"a".repeat(65)).is_err());
        assert!(storage.set_item("valid_key-1", "x").is_ok());
    }

    #[test]
    fn test_open_storage_backends() {
        let temp = TempDir::new().unwrap();
        for backend in [Backend::Sqlite, Backend::File, Backend::Memory] {
            let mut storage = open_storage(backend, temp.path()).unwrap();
            storage.set_item("k", "v").unwrap();
            assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
        }
    }
}
