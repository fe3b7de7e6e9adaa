pub mod config;
pub mod editor;
pub mod error;
pub mod hooks;

pub use config::HookConfig;
pub use editor::{SAE_IMAGE_EDITOR, image_editors, supports_mime_type};
pub use error::HookError;
pub use hooks::{StorageHooks, UploadDir, UploadResult, UploadedFile};
