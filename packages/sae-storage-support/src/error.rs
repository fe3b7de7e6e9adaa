use sae_core::{ConfigError, EditorError, SaeError, StorageError};

/// ホストに返すエラー
///
/// `code()` はホスト側のエラーコードに対応する。
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("{message}")]
    Config {
        code: &'static str,
        message: String,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    StorageUnavailable(String),

    #[error("{message}")]
    Editor {
        code: &'static str,
        message: String,
    },

    #[error("{0}")]
    Internal(String),
}

impl HookError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { code, .. } | Self::Editor { code, .. } => *code,
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<SaeError> for HookError {
    fn from(err: SaeError) -> Self {
        match err {
            SaeError::Validation(msg) => {
                tracing::warn!(error = %msg, "validation error");
                HookError::BadRequest(msg)
            }
            SaeError::Config(config_err) => config_err.into(),
            SaeError::Storage(storage_err) => storage_err.into(),
            SaeError::Editor(editor_err) => editor_err.into(),
            err @ SaeError::UniqueFilenameExhausted { .. } => {
                tracing::error!(error = %err, "unique filename exhausted");
                HookError::Internal(err.to_string())
            }
        }
    }
}

impl From<ConfigError> for HookError {
    fn from(err: ConfigError) -> Self {
        tracing::error!(code = err.code(), error = %err, "invalid SAE settings");
        HookError::Config {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for HookError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => {
                tracing::warn!(key = %key, "object not found");
                HookError::NotFound("object not found".to_string())
            }
            StorageError::AlreadyExists { key } => {
                tracing::warn!(key = %key, "object already exists");
                HookError::BadRequest(format!("object already exists: {key}"))
            }
            StorageError::TooLarge { size, max } => {
                tracing::warn!(size, max, "object too large");
                HookError::BadRequest(format!("object too large ({size} > {max} bytes)"))
            }
            StorageError::Forbidden => {
                tracing::error!("access denied by SAE Storage (check access keys)");
                HookError::StorageUnavailable("storage access denied".to_string())
            }
            StorageError::Internal(msg) => {
                tracing::error!(error = %msg, "storage error");
                HookError::StorageUnavailable("storage error".to_string())
            }
        }
    }
}

impl From<EditorError> for HookError {
    fn from(err: EditorError) -> Self {
        tracing::warn!(code = err.code(), path = %err.path(), error = %err, "image editor error");
        HookError::Editor {
            code: err.code(),
            message: err.to_string(),
        }
    }
}
