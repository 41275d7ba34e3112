// JSON file backend
// The whole state lives in one pretty-printed document that is replaced on every write

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::error::{Result, StoreError};
use super::model::StoreState;
use super::PostStore;
use crate::logger;

/// Store backed by a single JSON file
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open (and if needed initialize) the document at `path`.
    ///
    /// A missing document is created with the default state. A document
    /// that cannot be read or parsed is reset to the default state. Fails
    /// only if that default state cannot be written.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };

        match store.read_state().await {
            Ok(Some(mut state)) => {
                if state.repair_next_id() {
                    logger::log_warning(&format!(
                        "nextId in {} was behind stored ids, advanced to {}",
                        store.path.display(),
                        state.next_id
                    ));
                    store.write_state(&state).await?;
                }
            }
            Ok(None) => store.write_state(&StoreState::default()).await?,
            Err(e) => {
                logger::log_warning(&format!("{e}; resetting to an empty store"));
                store.write_state(&StoreState::default()).await?;
            }
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw document as stored, `Ok(None)` when the file does not exist
    async fn read_state(&self) -> Result<Option<StoreState>> {
        let bytes = match fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                path: self.path.clone(),
                source,
            })
    }

    /// Write to a sibling temp file, then rename over the target
    async fn write_state(&self, state: &StoreState) -> Result<()> {
        let content = serde_json::to_vec_pretty(state)?;
        let tmp = self.temp_path();

        fs::write(&tmp, content)
            .await
            .map_err(|source| StoreError::Write {
                path: tmp.clone(),
                source,
            })?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl PostStore for JsonFileStore {
    async fn load(&self) -> Result<StoreState> {
        match self.read_state().await {
            Ok(state) => {
                let mut state = state.unwrap_or_default();
                state.repair_next_id();
                Ok(state)
            }
            Err(e) => {
                // Transient read failures degrade to an empty snapshot
                logger::log_warning(&format!("{e}; serving empty state"));
                Ok(StoreState::default())
            }
        }
    }

    async fn load_for_update(&self) -> Result<StoreState> {
        let mut state = self.read_state().await?.unwrap_or_default();
        state.repair_next_id();
        Ok(state)
    }

    async fn persist(&self, state: &StoreState) -> Result<()> {
        self.write_state(state).await
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
