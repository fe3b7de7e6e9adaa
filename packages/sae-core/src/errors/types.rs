use thiserror::Error;

/// SAE 連携の統合エラー型
#[derive(Debug, Error)]
pub enum SaeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("editor error: {0}")]
    Editor(#[from] EditorError),

    #[error("no unique filename for {filename} after {attempts} attempts")]
    UniqueFilenameExhausted { filename: String, attempts: u32 },
}

/// 設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("there is a invalid_domain: {value:?}")]
    InvalidDomain { value: String },

    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid options record: {0}")]
    Parse(String),
}

impl ConfigError {
    /// ホスト側に返すエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDomain { .. } => "invalid_domain_name",
            Self::Missing(_) => "missing_option",
            Self::Parse(_) => "invalid_options",
        }
    }
}

/// ストレージアクセスエラー
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("object already exists: {key}")]
    AlreadyExists { key: String },

    #[error("access denied")]
    Forbidden,

    #[error("object too large ({size} > {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("storage error: {0}")]
    Internal(String),
}

/// SAE Image サービスのエラー
#[derive(Debug, Error)]
pub enum ImageServiceError {
    #[error("no image data submitted")]
    NoData,

    #[error("image service rejected the request: {0}")]
    Rejected(String),

    #[error("image service request failed: {0}")]
    Request(String),
}

/// 画像編集エラー
///
/// どのバリアントも対象ファイルのパスを持つ。
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("File doesn't exist? ({path})")]
    Loading { path: String },

    #[error("image is not loaded: {path}")]
    NotLoaded { path: String },

    #[error("image exceeds memory limit ({size} > {max} bytes): {path}")]
    TooLarge { path: String, size: u64, max: u64 },

    #[error("Could not read image size. ({path})")]
    InvalidImage { path: String },

    #[error("Could not calculate resized image dimensions ({path})")]
    Dimensions { path: String },

    #[error("Image resize failed. ({path})")]
    Resize { path: String },

    #[error("Image crop failed. ({path})")]
    Crop { path: String },

    #[error("Image rotate failed. ({path})")]
    Rotate { path: String },

    #[error("Image flip failed. ({path})")]
    Flip { path: String },

    #[error("Image Editor Save Failed ({path})")]
    Save { path: String },

    #[error("Image stream failed. ({path})")]
    Stream { path: String },
}

impl EditorError {
    /// ホスト側に返すエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            Self::Loading { .. } => "error_loading_image",
            Self::NotLoaded { .. } => "image_not_loaded",
            Self::TooLarge { .. } => "image_too_large",
            Self::InvalidImage { .. } => "invalid_image",
            Self::Dimensions { .. } => "error_getting_dimensions",
            Self::Resize { .. } => "image_resize_error",
            Self::Crop { .. } => "image_crop_error",
            Self::Rotate { .. } => "image_rotate_error",
            Self::Flip { .. } => "image_flip_error",
            Self::Save { .. } => "image_save_error",
            Self::Stream { .. } => "image_stream_error",
        }
    }

    /// エラーの対象となったパス
    pub fn path(&self) -> &str {
        match self {
            Self::Loading { path }
            | Self::NotLoaded { path }
            | Self::TooLarge { path, .. }
            | Self::InvalidImage { path }
            | Self::Dimensions { path }
            | Self::Resize { path }
            | Self::Crop { path }
            | Self::Rotate { path }
            | Self::Flip { path }
            | Self::Save { path }
            | Self::Stream { path } => path,
        }
    }
}
