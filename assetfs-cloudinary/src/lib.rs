//! Cloudinary-backed implementation of the assetfs filesystem contract.

pub mod adapter;
pub mod client;
pub mod config;
pub mod options;
pub mod resource;

pub use adapter::CloudinaryAdapter;
pub use client::http::HttpClient;
pub use client::AssetClient;
pub use config::DiskConfig;
