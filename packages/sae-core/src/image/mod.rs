//! SAE Image を使った画像編集

pub mod capabilities;
pub mod client;
pub mod dimensions;
pub mod encode;
pub mod format;
pub mod service;
pub mod session;

pub use capabilities::{EditorCapabilities, OutputTarget, WordPressCapabilities};
pub use client::HttpImageClient;
pub use dimensions::{ResizeDimensions, constrain_dimensions, resize_dimensions};
pub use encode::encode_image;
pub use format::{OutputFormat, supports_mime_type};
pub use service::{CropBox, ImageAttr, ImageService, RemoteScope};
pub use session::{ImageSession, ResizedImage, SavedImage, Size, SizeSpec};
