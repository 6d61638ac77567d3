use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tokio_util::sync::CancellationToken;

use super::AdapterError;

/// Blob storage for session audio (`audio/<filename>`), report PDFs
/// (`reports/<filename>`), and the question-audio cache
/// (`question-audio/hu-HU/<question_id>.mp3`).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &str, cancel: &CancellationToken) -> Result<Option<Vec<u8>>, AdapterError>;
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>, cancel: &CancellationToken) -> Result<(), AdapterError>;
}

/// Filesystem-backed store rooted at a configured directory — stands in
/// for a real blob service (S3-compatible) without pulling in a vendor
/// SDK the pack doesn't otherwise use.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, key: &str, cancel: &CancellationToken) -> Result<Option<Vec<u8>>, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AdapterError::Network(e.to_string())),
        }
    }

    async fn put(&self, key: &str, _content_type: &str, bytes: Vec<u8>, cancel: &CancellationToken) -> Result<(), AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AdapterError::Network(e.to_string()))?;
        }
        fs::write(&path, &bytes)
            .await
            .map_err(|e| AdapterError::Network(e.to_string()))
    }
}

/// In-memory double used by service tests and by the question-audio
/// cache tests — last write wins under concurrent writers, matching the
/// shared-cache convergence invariant.
#[derive(Default)]
pub struct InMemoryStore {
    objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get(&self, key: &str, cancel: &CancellationToken) -> Result<Option<Vec<u8>>, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        Ok(self.objects.lock().unwrap().get(key).map(|(_, bytes)| bytes.clone()))
    }

    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>, cancel: &CancellationToken) -> Result<(), AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_through_memory_store() {
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();
        store.put("reports/r1.pdf", "application/pdf", vec![1, 2, 3], &cancel).await.unwrap();
        let bytes = store.get("reports/r1.pdf", &cancel).await.unwrap();
        assert_eq!(bytes, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn missing_key_is_none_not_error() {
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();
        let bytes = store.get("nope", &cancel).await.unwrap();
        assert!(bytes.is_none());
    }
}
