// Persistence backends for the canonical todo list

use crate::jsonl;
use crate::models::TodoItem;
use crate::record::Record;
use eyre::{Context, Result, eyre};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// Name of the store directory created under the chosen root
pub const STORE_DIR: &str = ".todostore";

/// Opaque load/save of the full todo list
///
/// The store treats both operations as best effort: a failed load starts from an empty
/// list and a failed save is logged, never rolled back.
pub trait Storage {
    /// Load the persisted list; `Ok(None)` on first run
    fn load(&self) -> Result<Option<Vec<TodoItem>>>;

    /// Overwrite the persisted list with `items`
    fn save(&mut self, items: &[TodoItem]) -> Result<()>;
}

/// Directory-backed storage: one `{key}.jsonl` file per storage key
#[derive(Debug)]
pub struct JsonlStorage {
    base_path: PathBuf,
    key: String,
}

impl JsonlStorage {
    /// Open or create storage at the given root
    ///
    /// Files live in a `.todostore` subdirectory of the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_key(path, TodoItem::collection_name())
    }

    pub fn open_with_key<P: AsRef<Path>>(path: P, key: &str) -> Result<Self> {
        Self::validate_key(key)?;
        let base_path = path.as_ref().join(STORE_DIR);

        // Create directory if it doesn't exist
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let storage = Self {
            base_path,
            key: key.to_string(),
        };
        storage.create_gitignore()?;

        debug!(path = ?storage.file_path(), "Opened JSONL storage");
        Ok(storage)
    }

    /// Path of the JSONL file holding the list
    pub fn file_path(&self) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", self.key))
    }

    fn create_gitignore(&self) -> Result<()> {
        let gitignore_path = self.base_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(gitignore_path, "*.lock\n*.tmp\n")?;
        }
        Ok(())
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

impl Storage for JsonlStorage {
    fn load(&self) -> Result<Option<Vec<TodoItem>>> {
        jsonl::read_jsonl(&self.file_path())
    }

    fn save(&mut self, items: &[TodoItem]) -> Result<()> {
        jsonl::write_jsonl(&self.file_path(), items)
    }
}

/// In-process storage, keyed like the file backend
///
/// Clones share the same underlying map, so a caller can keep a handle after giving one
/// to a store.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    key: String,
    entries: Rc<RefCell<HashMap<String, String>>>,
    fail_saves: Rc<Cell<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_key(TodoItem::collection_name())
    }

    pub fn with_key(key: &str) -> Self {
        Self {
            key: key.to_string(),
            entries: Rc::new(RefCell::new(HashMap::new())),
            fail_saves: Rc::new(Cell::new(false)),
        }
    }

    /// Raw JSONL currently stored under the key
    pub fn raw(&self) -> Option<String> {
        self.entries.borrow().get(&self.key).cloned()
    }

    /// Put raw content under the key, bypassing serialization
    pub fn set_raw(&self, content: impl Into<String>) {
        self.entries.borrow_mut().insert(self.key.clone(), content.into());
    }

    /// Make every following save fail
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<Vec<TodoItem>>> {
        Ok(self.raw().map(|content| jsonl::from_jsonl_str(&content)))
    }

    fn save(&mut self, items: &[TodoItem]) -> Result<()> {
        if self.fail_saves.get() {
            return Err(eyre!("Storage unavailable"));
        }
        let content = jsonl::to_jsonl_string(items)?;
        self.set_raw(content);
        Ok(())
    }
}
