pub mod config;
pub mod constants;
pub mod errors;
pub mod filename;
pub mod image;
pub mod storage;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

// 公開API
pub use config::{DomainName, SaeOptions};
pub use constants::{DEFAULT_QUALITY, MAX_IMAGE_BYTES, MAX_UNIQUE_ATTEMPTS};
pub use errors::{ConfigError, EditorError, ImageServiceError, SaeError, StorageError};
pub use filename::{FilenameResolver, UniqueFilenameCallback, sanitize_file_name, split_extension};
pub use image::{
    EditorCapabilities, HttpImageClient, ImageService, ImageSession, OutputFormat, ResizedImage,
    SavedImage, Size, SizeSpec, WordPressCapabilities, supports_mime_type,
};
pub use storage::{MemoryStore, ObjectStore, StorageClient, StoragePath, UploadOptions};
pub use validation::validate_key;
