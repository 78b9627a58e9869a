pub mod adapter;
pub mod error;
pub mod metadata;
pub mod options;
pub mod path;

pub use adapter::FilesystemAdapter;
pub use error::AdapterError;
pub use metadata::FileMetadata;
pub use options::CallOptions;
