use crate::errors::StorageError;
use bytes::Bytes;
use std::path::Path;

/// アップロード時のオプション
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub content_type: Option<String>,
    /// false の場合、既存オブジェクトがあれば `AlreadyExists` を返す
    pub overwrite: bool,
}

/// SAE Storage に対する操作
///
/// すべての呼び出しはリモートへの同期的な往復となる。
pub trait ObjectStore {
    /// オブジェクトが存在するか
    fn exists(&self, domain: &str, path: &str) -> Result<bool, StorageError>;

    /// オブジェクトを読み込む
    fn read(&self, domain: &str, path: &str) -> Result<Bytes, StorageError>;

    /// バイト列を書き込み、公開 URL を返す（既存のものは上書き）
    fn write(&self, domain: &str, path: &str, data: &[u8]) -> Result<String, StorageError>;

    /// ローカルファイルをアップロードし、公開 URL を返す
    fn upload(
        &self,
        domain: &str,
        path: &str,
        source: &Path,
        options: &UploadOptions,
    ) -> Result<String, StorageError>;

    /// オブジェクトを削除する（存在しなければ false）
    fn delete(&self, domain: &str, path: &str) -> Result<bool, StorageError>;

    /// アプリが持つドメインの一覧
    fn list_domains(&self) -> Result<Vec<String>, StorageError>;

    /// アプリ名
    fn app_name(&self) -> String;
}
