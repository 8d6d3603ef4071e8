use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CallParams, CallType};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One executed call as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCall {
    pub call_type: String,
    pub caller: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub input_data: String,
    #[serde(default)]
    pub gas_limit: String,
    #[serde(default)]
    pub salt: String,
    pub timestamp: DateTime<Utc>,
}

impl PersistedCall {
    pub fn new(params: &CallParams, timestamp: DateTime<Utc>) -> Self {
        Self {
            call_type: params.call_type.as_str().to_string(),
            caller: params.caller.clone(),
            target: params.target.clone(),
            value: params.value.clone(),
            input_data: params.input_data.clone(),
            gas_limit: params.gas_limit.clone(),
            salt: params.salt.clone(),
            timestamp,
        }
    }

    pub fn params(&self) -> CallParams {
        CallParams {
            call_type: CallType::parse(&self.call_type),
            caller: self.caller.clone(),
            target: self.target.clone(),
            value: self.value.clone(),
            input_data: self.input_data.clone(),
            gas_limit: self.gas_limit.clone(),
            salt: self.salt.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub calls: Vec<PersistedCall>,
}

/// Durable record of executed calls, replayed at startup.
#[async_trait::async_trait]
pub trait CallStore: Send + Sync {
    async fn append_call(&self, call: PersistedCall) -> Result<(), StoreError>;

    async fn load_calls(&self) -> Result<Vec<PersistedCall>, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

/// `{"calls": [...]}` JSON document rewritten on every append.
#[derive(Debug, Clone)]
pub struct JsonStateFile {
    path: PathBuf,
}

impl JsonStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StateFile, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(StateFile::default()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(StateFile::default());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, state: &StateFile) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(state)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait::async_trait]
impl CallStore for JsonStateFile {
    async fn append_call(&self, call: PersistedCall) -> Result<(), StoreError> {
        let mut state = self.load().await?;
        state.calls.push(call);
        self.save(&state).await
    }

    async fn load_calls(&self) -> Result<Vec<PersistedCall>, StoreError> {
        Ok(self.load().await?.calls)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.save(&StateFile::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateFile::new(dir.path().join("nested").join("state.json"));
        assert!(store.load_calls().await.unwrap().is_empty());

        let now = Utc::now();
        let params = CallParams {
            call_type: CallType::Create2,
            ..CallParams::default()
        };
        store.append_call(PersistedCall::new(&params, now)).await.unwrap();
        store
            .append_call(PersistedCall::new(&CallParams::default(), now))
            .await
            .unwrap();

        let calls = store.load_calls().await.unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].params(), params);
        assert_eq!(calls[0].timestamp, now);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"callType\": \"CREATE2\""));
        assert!(raw.contains("\"inputData\""));
    }

    #[tokio::test]
    async fn test_clear_empties_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateFile::new(dir.path().join("state.json"));
        store
            .append_call(PersistedCall::new(&CallParams::default(), Utc::now()))
            .await
            .unwrap();
        store.clear().await.unwrap();
        assert!(store.load_calls().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = JsonStateFile::new(&path);
        assert!(matches!(
            store.load_calls().await,
            Err(StoreError::Parse { .. })
        ));
    }
}
