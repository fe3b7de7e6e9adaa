use crate::constants::MAX_IMAGE_BYTES;
use crate::errors::{ConfigError, StorageError};
use crate::storage::path::public_base_url;
use crate::storage::store::{ObjectStore, UploadOptions};
use bytes::Bytes;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode, header};
use std::path::Path;

const ACCESS_KEY_HEADER: &str = "X-Sae-AccessKey";
const SECRET_KEY_HEADER: &str = "X-Sae-SecretKey";

/// SAE Storage クライアント
///
/// SAE Storage の REST ゲートウェイに HTTP リクエストを送信して
/// オブジェクトの存在確認・読み書き・削除を行う
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    app_name: String,
    access_key: String,
    secret_key: String,
}

impl StorageClient {
    /// 新しい StorageClient を作成する
    pub fn new(base_url: String, app_name: String, access_key: String, secret_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            app_name,
            access_key,
            secret_key,
        }
    }

    /// 環境変数から StorageClient を作成する
    ///
    /// 必須の環境変数:
    /// - SAE_STORAGE_URL
    /// - SAE_APPNAME
    /// - SAE_ACCESS_KEY
    /// - SAE_SECRET_KEY
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            std::env::var("SAE_STORAGE_URL").map_err(|_| ConfigError::Missing("SAE_STORAGE_URL"))?;
        let app_name =
            std::env::var("SAE_APPNAME").map_err(|_| ConfigError::Missing("SAE_APPNAME"))?;
        let access_key =
            std::env::var("SAE_ACCESS_KEY").map_err(|_| ConfigError::Missing("SAE_ACCESS_KEY"))?;
        let secret_key =
            std::env::var("SAE_SECRET_KEY").map_err(|_| ConfigError::Missing("SAE_SECRET_KEY"))?;

        Ok(Self::new(base_url, app_name, access_key, secret_key))
    }

    fn object_url(&self, domain: &str, path: &str) -> String {
        let encoded: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}/{}", self.base_url, domain, encoded.join("/"))
    }

    fn public_url(&self, domain: &str, path: &str) -> String {
        let compound = format!("{}-{}", self.app_name, domain);
        format!("{}{}", public_base_url(&compound), path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(ACCESS_KEY_HEADER, &self.access_key)
            .header(SECRET_KEY_HEADER, &self.secret_key)
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response, StorageError> {
        builder
            .send()
            .map_err(|e| StorageError::Internal(e.to_string()))
    }

    /// 成功以外のステータスをエラーに変換する
    fn check_status(key: &str, response: Response) -> Result<Response, StorageError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(StorageError::NotFound {
                key: key.to_string(),
            }),
            StatusCode::PRECONDITION_FAILED | StatusCode::CONFLICT => {
                Err(StorageError::AlreadyExists {
                    key: key.to_string(),
                })
            }
            StatusCode::FORBIDDEN => {
                tracing::error!(key = %key, "access denied by SAE Storage");
                Err(StorageError::Forbidden)
            }
            status => {
                tracing::error!(key = %key, status = %status, "unexpected response from SAE Storage");
                Err(StorageError::Internal(format!("unexpected status: {status}")))
            }
        }
    }

    fn put(
        &self,
        domain: &str,
        path: &str,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<String, StorageError> {
        let url = self.object_url(domain, path);
        let mut builder = self.request(Method::PUT, &url).body(data);
        if let Some(content_type) = &options.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if !options.overwrite {
            builder = builder.header(header::IF_NONE_MATCH, "*");
        }

        let response = self.send(builder)?;
        Self::check_status(path, response)?;

        Ok(self.public_url(domain, path))
    }
}

impl ObjectStore for StorageClient {
    fn exists(&self, domain: &str, path: &str) -> Result<bool, StorageError> {
        let url = self.object_url(domain, path);
        let response = self.send(self.request(Method::HEAD, &url))?;

        match Self::check_status(path, response) {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn read(&self, domain: &str, path: &str) -> Result<Bytes, StorageError> {
        let url = self.object_url(domain, path);
        let response = self.send(self.request(Method::GET, &url))?;
        let response = Self::check_status(path, response)?;

        // 読み込み前に Content-Length でサイズを確認
        if let Some(size) = response.content_length() {
            ensure_within_limit(size)?;
        }

        let data = response
            .bytes()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        ensure_within_limit(data.len() as u64)?;

        Ok(data)
    }

    fn write(&self, domain: &str, path: &str, data: &[u8]) -> Result<String, StorageError> {
        let options = UploadOptions {
            content_type: None,
            overwrite: true,
        };
        self.put(domain, path, data.to_vec(), &options)
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
        self.put(domain, path, data, options)
    }

    fn delete(&self, domain: &str, path: &str) -> Result<bool, StorageError> {
        let url = self.object_url(domain, path);
        let response = self.send(self.request(Method::DELETE, &url))?;

        match Self::check_status(path, response) {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn list_domains(&self) -> Result<Vec<String>, StorageError> {
        let url = format!("{}/?domains", self.base_url);
        let response = self.send(self.request(Method::GET, &url))?;
        let response = Self::check_status("?domains", response)?;

        response
            .json::<Vec<String>>()
            .map_err(|e| StorageError::Internal(e.to_string()))
    }

    fn app_name(&self) -> String {
        self.app_name.clone()
    }
}

/// 読み込むオブジェクトのサイズが上限以下か確認する
fn ensure_within_limit(size: u64) -> Result<(), StorageError> {
    if size > MAX_IMAGE_BYTES {
        return Err(StorageError::TooLarge {
            size,
            max: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}
