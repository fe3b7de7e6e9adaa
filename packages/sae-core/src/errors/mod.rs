mod types;

pub use types::{ConfigError, EditorError, ImageServiceError, SaeError, StorageError};
