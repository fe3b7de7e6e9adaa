pub mod options;

pub use options::{DomainName, SaeOptions};
