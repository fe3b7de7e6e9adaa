//! ホストのメディア処理を SAE Storage に向けるフック
//!
//! アップロードは一旦ローカルの一時ディレクトリに置かれ、
//! `handle_upload` でストレージに移される。

use crate::config::HookConfig;
use crate::error::HookError;
use sae_core::storage::path::{
    StoragePath, basename, dirname, join_key, public_base_url, strip_wrapper, wrapper_prefix,
};
use sae_core::{
    FilenameResolver, ImageService, ImageSession, ObjectStore, UploadOptions, validate_key,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 一時ディレクトリに置かれたアップロード
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub file: String,
    pub url: String,
    #[serde(rename = "type")]
    pub mime: String,
}

/// ストレージへ移した後のアップロード情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    /// スキームパス
    pub file: String,
    /// 公開 URL
    pub url: String,
    #[serde(rename = "type")]
    pub mime: String,
}

/// ホストのアップロード先ディレクトリ情報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDir {
    pub path: String,
    pub url: String,
    pub subdir: String,
    pub basedir: String,
    #[serde(rename = "baseurl")]
    pub base_url: String,
}

pub struct StorageHooks<S: ObjectStore> {
    store: S,
    config: HookConfig,
}

impl<S: ObjectStore> StorageHooks<S> {
    pub fn new(store: S, config: HookConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    /// 一時ディレクトリのアップロードを一意な名前でストレージに移す
    pub fn handle_upload(&self, upload: &UploadedFile) -> Result<UploadResult, HookError> {
        let domain = self.domain()?;
        let relative = self.strip_tmp(&upload.file)?;

        let dir = dirname(relative);
        let unique = FilenameResolver::new(&self.store).resolve(
            &domain,
            dir,
            basename(relative),
            None,
        )?;
        let key = join_key(dir, &unique);
        validate_key(&key)?;

        let options = UploadOptions {
            content_type: Some(upload.mime.clone()),
            overwrite: false,
        };
        let url = self
            .store
            .upload(&domain, &key, Path::new(&upload.file), &options)?;

        tracing::info!(domain = %domain, key = %key, mime = %upload.mime, "moved upload to SAE Storage");

        Ok(UploadResult {
            file: format!("{}{}", wrapper_prefix(&domain), key),
            url,
            mime: upload.mime.clone(),
        })
    }

    /// 添付ファイルをストレージから削除し、削除したキーを返す
    ///
    /// スキームパスならそのキーを、それ以外は `upload_dir.path` 内の同名ファイルを対象にする。
    pub fn delete_file(&self, file: &str, upload_dir: &UploadDir) -> Result<String, HookError> {
        let domain = self.domain()?;

        let key = match StoragePath::parse(file) {
            Some(path) if path.domain == domain => path.key(),
            _ => {
                let local = format!("{}/{}", upload_dir.path.trim_end_matches('/'), basename(file));
                self.strip_tmp(&local)?.to_string()
            }
        };

        if self.store.delete(&domain, &key)? {
            tracing::info!(domain = %domain, key = %key, "deleted object");
        } else {
            tracing::debug!(domain = %domain, key = %key, "nothing to delete");
        }

        Ok(key)
    }

    /// アップロード先をローカルの一時ディレクトリと公開 URL に差し替える
    pub fn reset_upload_dir(&self, dir: UploadDir) -> Result<UploadDir, HookError> {
        self.domain()?;

        let tmp = &self.config.tmp_dir;
        let basedir = match self.config.options.uploads_path() {
            Some(uploads) => format!("{tmp}{uploads}"),
            None => tmp.trim_end_matches('/').to_string(),
        };
        let base_url = self.uploads_base_url();

        Ok(UploadDir {
            path: format!("{basedir}{}", dir.subdir),
            url: format!("{}{}", base_url.trim_end_matches('/'), dir.subdir),
            subdir: dir.subdir,
            basedir,
            base_url,
        })
    }

    /// 添付ファイルの公開 URL
    pub fn attachment_url(&self, attached_file: &str) -> Result<String, HookError> {
        let domain = self.domain()?;
        let key = strip_wrapper(attached_file, &domain).trim_start_matches('/');

        Ok(format!(
            "{}{}",
            public_base_url(&self.config.options.domain),
            key
        ))
    }

    /// 保存済みのメタデータが公開アップロード URL を指していればそれを使う
    pub fn attached_file(&self, file: &str, attached_meta: &str) -> String {
        if !attached_meta.is_empty() && attached_meta.starts_with(&self.uploads_base_url()) {
            attached_meta.to_string()
        } else {
            file.to_string()
        }
    }

    /// スキームパスの接頭辞を取り除いた相対パス
    pub fn relative_upload_path(&self, path: &str) -> Result<String, HookError> {
        let domain = self.domain()?;
        Ok(strip_wrapper(path, &domain).to_string())
    }

    /// 画像編集セッションを開いて読み込む
    pub fn open_editor<I: ImageService>(
        &self,
        file: &str,
        service: I,
    ) -> Result<ImageSession<'_, S, I>, HookError> {
        let domain = self.domain()?;
        let mut session = ImageSession::new(file, &domain, &self.store, service);
        session.load()?;
        Ok(session)
    }

    /// 設定画面で選択できるドメイン
    pub fn available_domains(&self) -> Result<Vec<String>, HookError> {
        Ok(self.store.list_domains()?)
    }

    pub fn app_name(&self) -> String {
        self.store.app_name()
    }

    fn domain(&self) -> Result<String, HookError> {
        Ok(self.config.options.domain_name()?.domain)
    }

    fn uploads_base_url(&self) -> String {
        let base = public_base_url(&self.config.options.domain);
        match self.config.options.uploads_path() {
            Some(uploads) => format!("{base}{uploads}"),
            None => base,
        }
    }

    /// 一時ディレクトリからの相対パス
    fn strip_tmp<'p>(&self, local: &'p str) -> Result<&'p str, HookError> {
        local
            .strip_prefix(self.config.tmp_dir.as_str())
            .map(|rest| rest.trim_start_matches('/'))
            .ok_or_else(|| {
                tracing::warn!(file = %local, tmp_dir = %self.config.tmp_dir, "file is outside the temporary directory");
                HookError::BadRequest(format!("{local} is outside the temporary directory"))
            })
    }
}
