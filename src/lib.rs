//! Dataset Uploadr Library
//!
//! Client-side upload sessions for the dataset explorer backend.
//!
//! # Features
//!
//! - **Staging**: MIME type, size and count checks before anything is sent
//! - **Sequential Uploads**: one request at a time, in staging order
//! - **Observable Sessions**: every status change is published to subscribers
//! - **Typed Results**: X-ray, traffic and medical analysis payloads
//! - **Statistics**: dataset figures with a reference fallback
//!
//! # Example
//!
//! ```no_run
//! use dataset_uploadr::api::{Category, HttpApiClient};
//! use dataset_uploadr::config::Config;
//! use dataset_uploadr::upload::{FileCandidate, SessionHandle, UploadDriver};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let session = SessionHandle::new(config.upload.clone());
//!     session.stage([FileCandidate::from_path("chest.jpeg").await?]);
//!
//!     let driver = UploadDriver::new(HttpApiClient::new(&config.api)?, Category::Xray);
//!     let report = driver.run(&session).await?;
//!     println!("{} completed", report.completed);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod metrics;
pub mod stats;
pub mod telemetry;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use upload::{SessionHandle, UploadDriver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
