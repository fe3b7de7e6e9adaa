//! SAE Storage 上のオブジェクトを指すパスの扱い
//!
//! ホスト側からは `saestor://{domain}/{path}` 形式のスキームパスで参照し、
//! ストレージには `{path}` をキーとして保存する。

use crate::constants::{STORAGE_HOST_SUFFIX, STORAGE_SCHEME};
use std::fmt;
use url::Url;

/// `saestor://{domain}/` を返す
pub fn wrapper_prefix(domain: &str) -> String {
    format!("{STORAGE_SCHEME}://{domain}/")
}

/// 指定ドメインのスキームパスかどうか
pub fn is_wrapper(path: &str, domain: &str) -> bool {
    path.starts_with(&wrapper_prefix(domain))
}

/// スキームパスの接頭辞を取り除く（スキームパスでなければそのまま返す）
pub fn strip_wrapper<'a>(path: &'a str, domain: &str) -> &'a str {
    path.strip_prefix(&wrapper_prefix(domain)).unwrap_or(path)
}

/// SAE Storage の公開 URL をスキームパスに変換する
///
/// `http://{app}-{domain}.stor.sinaapp.com/a/b.jpg` → `saestor://{domain}/a/b.jpg`
pub fn convert_to_wrapper(url: &str, domain: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };

    match parsed.host_str() {
        Some(host) if host.ends_with(STORAGE_HOST_SUFFIX) => {
            format!("{}{}", wrapper_prefix(domain), raw_key(url))
        }
        _ => url.to_string(),
    }
}

/// URL のホスト以降をキーとして取り出す
///
/// `Url` はパスをパーセントエンコードするため、元の文字列から切り出してデコードする。
/// クエリとフラグメントは除く。
fn raw_key(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = rest.find('/').map_or("", |idx| &rest[idx + 1..]);
    let path = path.split(['?', '#']).next().unwrap_or(path);

    urlencoding::decode(path)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// ドメイン複合文字列から公開 URL のベースを作る
pub fn public_base_url(compound: &str) -> String {
    format!("http://{compound}.{STORAGE_HOST_SUFFIX}/")
}

/// ディレクトリとファイル名をキーとして結合する
pub fn join_key(dir: &str, filename: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        filename.to_string()
    } else {
        format!("{dir}/{filename}")
    }
}

/// パスの最後の要素
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// パスのディレクトリ部分（なければ空文字）
pub fn dirname(path: &str) -> &str {
    match path.trim_end_matches('/').rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// ストレージ上のオブジェクトの論理的な位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    pub domain: String,
    pub directory: String,
    pub filename: String,
}

impl StoragePath {
    pub fn new(
        domain: impl Into<String>,
        directory: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            directory: directory.into().trim_matches('/').to_string(),
            filename: filename.into(),
        }
    }

    /// ドメインとキーから作成する
    pub fn from_key(domain: impl Into<String>, key: &str) -> Self {
        let key = key.trim_start_matches('/');
        Self::new(domain, dirname(key), basename(key))
    }

    /// `saestor://{domain}/{key}` を分解する
    pub fn parse(path: &str) -> Option<Self> {
        let rest = path.strip_prefix(STORAGE_SCHEME)?.strip_prefix("://")?;
        let (domain, key) = rest.split_once('/')?;
        if domain.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self::from_key(domain, key))
    }

    /// ストレージのキー
    pub fn key(&self) -> String {
        join_key(&self.directory, &self.filename)
    }

    /// スキームパス
    pub fn to_wrapper(&self) -> String {
        format!("{}{}", wrapper_prefix(&self.domain), self.key())
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wrapper())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_prefix() {
        assert_eq!(wrapper_prefix("prod"), "saestor://prod/");
        assert!(is_wrapper("saestor://prod/uploads/a.jpg", "prod"));
        assert!(!is_wrapper("saestor://dev/uploads/a.jpg", "prod"));
        assert_eq!(strip_wrapper("saestor://prod/uploads/a.jpg", "prod"), "uploads/a.jpg");
        assert_eq!(strip_wrapper("uploads/a.jpg", "prod"), "uploads/a.jpg");
    }

    #[test]
    fn test_convert_to_wrapper() {
        assert_eq!(
            convert_to_wrapper("http://myapp-prod.stor.sinaapp.com/uploads/2024/a.jpg", "prod"),
            "saestor://prod/uploads/2024/a.jpg"
        );
        // SAE Storage 以外の URL はそのまま
        assert_eq!(
            convert_to_wrapper("https://example.com/a.jpg", "prod"),
            "https://example.com/a.jpg"
        );
        // URL でなければそのまま
        assert_eq!(convert_to_wrapper("/tmp/a.jpg", "prod"), "/tmp/a.jpg");
    }

    #[test]
    fn test_convert_to_wrapper_keeps_key_bytes() {
        assert_eq!(
            convert_to_wrapper("http://myapp-prod.stor.sinaapp.com/uploads/照片.jpg", "prod"),
            "saestor://prod/uploads/照片.jpg"
        );
        // エンコード済みの URL も同じキーになる
        assert_eq!(
            convert_to_wrapper(
                "http://myapp-prod.stor.sinaapp.com/uploads/%E7%85%A7%E7%89%87.jpg",
                "prod"
            ),
            "saestor://prod/uploads/照片.jpg"
        );
        assert_eq!(
            convert_to_wrapper("http://myapp-prod.stor.sinaapp.com/uploads/my photo.jpg?v=2#top", "prod"),
            "saestor://prod/uploads/my photo.jpg"
        );
    }

    #[test]
    fn test_key_helpers() {
        assert_eq!(join_key("uploads/2024", "a.jpg"), "uploads/2024/a.jpg");
        assert_eq!(join_key("uploads/", "a.jpg"), "uploads/a.jpg");
        assert_eq!(join_key("", "a.jpg"), "a.jpg");
        assert_eq!(basename("uploads/2024/a.jpg"), "a.jpg");
        assert_eq!(dirname("uploads/2024/a.jpg"), "uploads/2024");
        assert_eq!(dirname("a.jpg"), "");
    }

    #[test]
    fn test_storage_path_round_trip() {
        let path = StoragePath::parse("saestor://prod/uploads/2024/a.jpg").unwrap();
        assert_eq!(path.domain, "prod");
        assert_eq!(path.directory, "uploads/2024");
        assert_eq!(path.filename, "a.jpg");
        assert_eq!(path.key(), "uploads/2024/a.jpg");
        assert_eq!(path.to_string(), "saestor://prod/uploads/2024/a.jpg");

        assert!(StoragePath::parse("http://prod/a.jpg").is_none());
        assert!(StoragePath::parse("saestor://prod/").is_none());
    }
}
