pub mod sanitize;
pub mod unique;

pub use sanitize::{sanitize_file_name, split_extension};
pub use unique::{FilenameResolver, UniqueFilenameCallback};
