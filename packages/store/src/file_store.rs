//! # Filesystem-backed key-value store
//!
//! [`FileStore`] is a [`KvStore`] implementation that keeps each key in its own
//! JSON file, so the session survives restarts of the command-line client.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── token.json
//! ├── userInfo.json
//! └── verification_code_<phone>.json
//! ```
//!
//! ## Platform data directories
//!
//! The client resolves `<base_dir>` from its settings, defaulting to
//! [`dirs::data_dir()`]`/layergen`:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/layergen/` |
//! | Linux | `~/.local/share/layergen/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\layergen\` |
//!
//! [`dirs::data_dir()`]: https://docs.rs/dirs/latest/dirs/fn.data_dir.html

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::kv::{check_key, KvStore, StoreError};

/// Filesystem-backed KvStore for desktop persistence.
#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        check_key(key)?;
        Ok(self.base.join(format!("{key}.json")))
    }
}

impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.entry_path(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.entry_path(key)?;
        std::fs::create_dir_all(&self.base)?;
        std::fs::write(path, serde_json::to_vec_pretty(&value)?)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key)?;
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
