//! Key-value persistence for session state.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StorageError {
	#[error("storage I/O failed: {0}")]
	Io(#[from] std::io::Error),

	#[error("storage encoding failed: {0}")]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Small persistent map shared by the SDK components.
///
/// String and object accessors share one key space: `get_string` on a key
/// holding an object yields `None`.
pub trait KeyValueStore: Send + Sync {
	fn get_string(&self, key: &str) -> Option<String>;

	fn set_string(&self, key: &str, value: &str) -> Result<()>;

	fn get_object(&self, key: &str) -> Option<Value>;

	fn set_object(&self, key: &str, value: &Value) -> Result<()>;
}

/// Process-local store, used by tests and by hosts that do not persist.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

impl KeyValueStore for MemoryStore {
	fn get_string(&self, key: &str) -> Option<String> {
		self.entries.lock().get(key).and_then(Value::as_str).map(str::to_string)
	}

	fn set_string(&self, key: &str, value: &str) -> Result<()> {
		self.entries.lock().insert(key.to_string(), Value::String(value.to_string()));
		Ok(())
	}

	fn get_object(&self, key: &str) -> Option<Value> {
		self.entries.lock().get(key).cloned()
	}

	fn set_object(&self, key: &str, value: &Value) -> Result<()> {
		self.entries.lock().insert(key.to_string(), value.clone());
		Ok(())
	}
}

/// Store backed by a single JSON document on disk.
///
/// The whole document is rewritten on every update. A missing or unreadable
/// file starts an empty store.
#[derive(Debug)]
pub struct FileStore {
	path: PathBuf,
	entries: Mutex<Map<String, Value>>,
}

impl FileStore {
	pub fn open(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let entries = match fs::read_to_string(&path) {
			Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
				Ok(entries) => entries,
				Err(err) => {
					warn!(target: "fh.store", path = %path.display(), error = %err, "ignoring unreadable store");
					Map::new()
				}
			},
			Err(_) => Map::new(),
		};
		debug!(target: "fh.store", path = %path.display(), entries = entries.len(), "store opened");
		Self {
			path,
			entries: Mutex::new(entries),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn update(&self, key: &str, value: Value) -> Result<()> {
		let mut entries = self.entries.lock();
		entries.insert(key.to_string(), value);
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)?;
			}
		}
		let json = serde_json::to_string_pretty(&*entries)?;
		fs::write(&self.path, json)?;
		Ok(())
	}
}

impl KeyValueStore for FileStore {
	fn get_string(&self, key: &str) -> Option<String> {
		self.entries.lock().get(key).and_then(Value::as_str).map(str::to_string)
	}

	fn set_string(&self, key: &str, value: &str) -> Result<()> {
		self.update(key, Value::String(value.to_string()))
	}

	fn get_object(&self, key: &str) -> Option<Value> {
		self.entries.lock().get(key).cloned()
	}

	fn set_object(&self, key: &str, value: &Value) -> Result<()> {
		self.update(key, value.clone())
	}
}
