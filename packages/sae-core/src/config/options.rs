use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 永続化された SAE 設定レコード
///
/// `sae_domain` は `"{app}-{domain}"` 形式の複合文字列。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaeOptions {
    #[serde(rename = "sae_domain")]
    pub domain: String,
    #[serde(rename = "sae_uploads", default)]
    pub uploads: Option<String>,
}

impl SaeOptions {
    pub fn new(domain: impl Into<String>, uploads: Option<String>) -> Self {
        Self {
            domain: domain.into(),
            uploads,
        }
    }

    /// 環境変数から SaeOptions を作成する
    ///
    /// 必須の環境変数:
    /// - SAE_DOMAIN
    ///
    /// 任意の環境変数:
    /// - SAE_UPLOADS
    pub fn from_env() -> Result<Self, ConfigError> {
        let domain = std::env::var("SAE_DOMAIN").map_err(|_| ConfigError::Missing("SAE_DOMAIN"))?;
        let uploads = std::env::var("SAE_UPLOADS").ok().filter(|u| !u.is_empty());

        Ok(Self::new(domain, uploads))
    }

    /// JSON 形式の設定レコードを読み込む
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 複合文字列をアプリ名とドメイン名に分解する
    pub fn domain_name(&self) -> Result<DomainName, ConfigError> {
        self.domain.parse()
    }

    /// アップロード先のサブパス（末尾のスラッシュなし）
    pub fn uploads_path(&self) -> Option<&str> {
        self.uploads
            .as_deref()
            .map(|u| u.trim_matches('/'))
            .filter(|u| !u.is_empty())
    }
}

/// `"{app}-{domain}"` を分解したもの
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainName {
    pub app: String,
    pub domain: String,
}

impl FromStr for DomainName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        match parts.as_slice() {
            [app, domain] if !app.is_empty() && !domain.is_empty() => Ok(Self {
                app: (*app).to_string(),
                domain: (*domain).to_string(),
            }),
            _ => Err(ConfigError::InvalidDomain {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain_name() {
        let name: DomainName = "myapp-prod".parse().unwrap();
        assert_eq!(name.app, "myapp");
        assert_eq!(name.domain, "prod");
    }

    #[test]
    fn test_parse_invalid_domain_name() {
        // 区切り文字なし
        let err = "invalid".parse::<DomainName>().unwrap_err();
        assert_eq!(err.code(), "invalid_domain_name");

        // 区切りが多すぎる・空のセグメント
        assert!("a-b-c".parse::<DomainName>().is_err());
        assert!("app-".parse::<DomainName>().is_err());
        assert!("-prod".parse::<DomainName>().is_err());
    }

    #[test]
    fn test_options_from_json() {
        let options =
            SaeOptions::from_json(r#"{"sae_domain":"myapp-prod","sae_uploads":"/uploads/"}"#)
                .unwrap();
        assert_eq!(options.domain, "myapp-prod");
        assert_eq!(options.uploads_path(), Some("uploads"));
        assert_eq!(options.domain_name().unwrap().domain, "prod");
    }

    #[test]
    fn test_options_without_uploads() {
        let options = SaeOptions::from_json(r#"{"sae_domain":"myapp-prod"}"#).unwrap();
        assert_eq!(options.uploads_path(), None);

        assert!(SaeOptions::from_json("not json").is_err());
    }
}
