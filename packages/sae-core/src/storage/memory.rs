//! インメモリのオブジェクトストア
//!
//! 永続化しない。開発・テスト・組み込み用途向け。

use crate::errors::StorageError;
use crate::storage::path::public_base_url;
use crate::storage::store::{ObjectStore, UploadOptions};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// インメモリの ObjectStore 実装
#[derive(Default)]
pub struct MemoryStore {
    app_name: String,
    domains: Vec<String>,
    objects: Mutex<BTreeMap<(String, String), Bytes>>,
    probes: AtomicUsize,
}

impl MemoryStore {
    pub fn new(app_name: impl Into<String>, domains: Vec<String>) -> Self {
        Self {
            app_name: app_name.into(),
            domains,
            ..Self::default()
        }
    }

    /// オブジェクトを追加した状態で返す
    pub fn with_object(self, domain: &str, path: &str, data: impl Into<Bytes>) -> Self {
        self.insert(domain, path, data.into());
        self
    }

    /// これまでの exists 呼び出し回数
    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// 保存されているキーの一覧（ドメイン内、ソート済み）
    pub fn keys(&self, domain: &str) -> Vec<String> {
        self.lock()
            .keys()
            .filter(|(d, _)| d == domain)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// 保存されているオブジェクトの数
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<(String, String), Bytes>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn entry_key(domain: &str, path: &str) -> (String, String) {
        (domain.to_string(), path.trim_start_matches('/').to_string())
    }

    fn insert(&self, domain: &str, path: &str, data: Bytes) {
        self.lock().insert(Self::entry_key(domain, path), data);
    }

    fn public_url(&self, domain: &str, path: &str) -> String {
        let compound = format!("{}-{}", self.app_name, domain);
        format!("{}{}", public_base_url(&compound), path.trim_start_matches('/'))
    }
}

impl ObjectStore for MemoryStore {
    fn exists(&self, domain: &str, path: &str) -> Result<bool, StorageError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock().contains_key(&Self::entry_key(domain, path)))
    }

    fn read(&self, domain: &str, path: &str) -> Result<Bytes, StorageError> {
        self.lock()
            .get(&Self::entry_key(domain, path))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: path.to_string(),
            })
    }

    fn write(&self, domain: &str, path: &str, data: &[u8]) -> Result<String, StorageError> {
        self.insert(domain, path, Bytes::copy_from_slice(data));
        Ok(self.public_url(domain, path))
    }

    fn upload(
        &self,
        domain: &str,
        path: &str,
        source: &Path,
        options: &UploadOptions,
    ) -> Result<String, StorageError> {
        let data = std::fs::read(source).map_err(|e| {
            StorageError::Internal(format!("failed to read {}: {e}", source.display()))
        })?;

        let mut objects = self.lock();
        let key = Self::entry_key(domain, path);
        if !options.overwrite && objects.contains_key(&key) {
            return Err(StorageError::AlreadyExists {
                key: path.to_string(),
            });
        }
        objects.insert(key, Bytes::from(data));
        drop(objects);

        Ok(self.public_url(domain, path))
    }

    fn delete(&self, domain: &str, path: &str) -> Result<bool, StorageError> {
        Ok(self.lock().remove(&Self::entry_key(domain, path)).is_some())
    }

    fn list_domains(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.domains.clone())
    }

    fn app_name(&self) -> String {
        self.app_name.clone()
    }
}
