pub mod client;
pub mod memory;
pub mod path;
pub mod store;

pub use client::StorageClient;
pub use memory::MemoryStore;
pub use path::StoragePath;
pub use store::{ObjectStore, UploadOptions};
// StorageError は errors モジュールで定義済み
pub use crate::errors::StorageError;
