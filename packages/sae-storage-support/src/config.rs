use sae_core::{ConfigError, SaeOptions};

/// フック全体の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    pub options: SaeOptions,
    /// アップロードを一時的に置くローカルディレクトリ（末尾は `/`）
    pub tmp_dir: String,
}

impl HookConfig {
    pub fn new(options: SaeOptions, tmp_dir: impl Into<String>) -> Self {
        let mut tmp_dir = tmp_dir.into();
        if !tmp_dir.ends_with('/') {
            tmp_dir.push('/');
        }
        Self { options, tmp_dir }
    }

    /// 環境変数から HookConfig を作成する
    ///
    /// 必須の環境変数:
    /// - SAE_TMP_PATH
    /// - SAE_DOMAIN（SaeOptions::from_env を参照）
    pub fn from_env() -> Result<Self, ConfigError> {
        let tmp_dir =
            std::env::var("SAE_TMP_PATH").map_err(|_| ConfigError::Missing("SAE_TMP_PATH"))?;
        let options = SaeOptions::from_env()?;

        Ok(Self::new(options, tmp_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tmp_dir_gets_trailing_slash() {
        let config = HookConfig::new(SaeOptions::new("myapp-prod", None), "/tmp/sae");
        assert_eq!(config.tmp_dir, "/tmp/sae/");

        let config = HookConfig::new(SaeOptions::new("myapp-prod", None), "/tmp/sae/");
        assert_eq!(config.tmp_dir, "/tmp/sae/");
    }
}
