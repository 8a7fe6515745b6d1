//! Dataset explorer API
//!
//! Typed access to the backend: multipart uploads and the dataset read
//! endpoints. The transport is reached through traits ([`DatasetApi`] here and
//! [`crate::upload::Uploader`]) so the session core and the statistics board
//! can run against substitutes.

use async_trait::async_trait;
use thiserror::Error;

pub mod client;
pub mod models;

pub use client::HttpApiClient;
pub use models::{
    AnalysisResult, Category, ChestXrayStats, Dataset, DatasetCategories, DatasetSample,
    DetectedObject, DistributionSlice, ImageClass, KittiDataType, KittiFrame, KittiSequence,
    KittiSequenceDetail, MedicalAnalysis, PneumoniaDetection, TinyImageNetSample,
    TinyImageNetStats, TrafficAnalysis, UploadRecord, UploadResponse, XrayAnalysis,
};

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Upload failed: {0}")]
    UploadRejected(String),

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse response: {0}")]
    DecodeError(String),
}

/// Read-only dataset endpoints
#[async_trait]
pub trait DatasetApi: Send + Sync {
    async fn datasets(&self) -> Result<Vec<Dataset>, ApiError>;

    async fn chest_xray_statistics(&self) -> Result<ChestXrayStats, ApiError>;

    async fn tiny_imagenet_statistics(&self) -> Result<TinyImageNetStats, ApiError>;

    async fn chest_xray_samples(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<DatasetSample>, ApiError>;

    async fn tiny_imagenet_classes(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ImageClass>, ApiError>;

    async fn tiny_imagenet_samples(
        &self,
        class_id: &str,
        limit: u32,
    ) -> Result<Vec<TinyImageNetSample>, ApiError>;

    async fn kitti_sequences(&self) -> Result<Vec<KittiSequence>, ApiError>;

    async fn kitti_sequence(&self, sequence_id: &str) -> Result<KittiSequenceDetail, ApiError>;

    async fn kitti_frames(
        &self,
        sequence_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<KittiFrame>, ApiError>;
}
