//! Vercel Blob client library
//!
//! Async client for the Vercel Blob object store.
//!
//! # Features
//!
//! - **Multipart uploads**: large payloads split into 5 MiB parts, uploaded
//!   by a bounded worker pool and assembled server-side
//! - **Retries**: 502/503/504 and transport failures retried with linear backoff
//! - **Full surface**: put, list, head, delete, copy, download
//! - **Observability**: `tracing` spans per operation, Prometheus metrics
//!
//! # Example
//!
//! ```no_run
//! use vercel_blob::{BlobClient, ClientConfig, PutOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BlobClient::new(ClientConfig::default())?;
//!     let data = std::fs::read("video.mp4")?;
//!     let blob = client
//!         .put("videos/video.mp4", data, PutOptions::new().multipart(true))
//!         .await?;
//!     println!("{}", blob.url);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod blob;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod progress;
pub mod request;
pub mod upload;

// Re-export commonly used types
pub use blob::{
    BlobClient, BlobDescriptor, CopyOptions, DownloadOptions, ListMode, ListOptions, PutOptions,
    RequestOptions,
};
pub use config::ClientConfig;
pub use error::BlobError;
pub use progress::set_progress_bar_colors;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
