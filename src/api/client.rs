//! HTTP client for the dataset explorer backend
//!
//! # Example
//!
//! ```no_run
//! use dataset_uploadr::api::{Category, DatasetApi, HttpApiClient};
//! use dataset_uploadr::config::ApiConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpApiClient::new(&ApiConfig::default())?;
//! let stats = client.chest_xray_statistics().await?;
//! println!("{} images", stats.total_images);
//! # Ok(())
//! # }
//! ```

use super::models::{
    ChestXrayStats, ClassList, Dataset, DatasetList, DatasetSample, FrameList, ImageClass,
    KittiFrame, KittiSequence, KittiSequenceDetail, SampleList, SequenceList, TinyImageNetSample,
    TinyImageNetSampleList, TinyImageNetStats, UploadResponse,
};
use super::{ApiError, Category, DatasetApi};
use crate::config::ApiConfig;
use crate::metrics;
use crate::upload::{FileCandidate, UploadFailure, Uploader};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Multipart field name expected by the upload endpoints
const UPLOAD_FIELD: &str = "files";

/// reqwest-backed API client
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    /// Create a client from configuration
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(ApiError::ConfigError(format!(
                "Base URL '{}' must start with http:// or https://",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of `path` with `id` appended as one percent-encoded segment
    fn resource_url(&self, path: &str, id: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| ApiError::ConfigError(format!("Invalid URL for {}: {}", path, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::ConfigError(format!("Base URL cannot take a path: {}", path)))?
            .push(id);
        Ok(url)
    }

    /// GET a JSON document from `path`
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.fetch_json(path, self.url(path), query).await
    }

    /// GET a JSON document. `endpoint` is the route template used for
    /// spans and metrics labels.
    #[tracing::instrument(
        name = "api.get",
        skip(self, url, query),
        fields(http.method = "GET", http.status_code = tracing::field::Empty),
        err
    )]
    async fn fetch_json<T: DeserializeOwned, U: reqwest::IntoUrl + Send>(
        &self,
        endpoint: &str,
        url: U,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_api_error(endpoint);
                return Err(e.into());
            }
        };
        tracing::Span::current().record("http.status_code", response.status().as_u16());

        if !response.status().is_success() {
            metrics::record_api_error(endpoint);
            return Err(ApiError::RequestFailed(status_text(response.status())));
        }

        decode(response).await
    }

    /// POST one file as a multipart body to `/upload/{category}`
    #[tracing::instrument(
        name = "api.upload",
        skip(self, file),
        fields(
            category = %category,
            file = %file.name,
            upload.bytes = file.byte_size(),
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn upload_file(
        &self,
        category: Category,
        file: FileCandidate,
    ) -> Result<UploadResponse, ApiError> {
        let length = file.byte_size();
        let part = Part::stream_with_length(Body::from(file.data), length)
            .file_name(file.name)
            .mime_str(&file.mime_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(self.url(&format!("/upload/{}", category)))
            .multipart(form)
            .send()
            .await?;
        tracing::Span::current().record("http.status_code", response.status().as_u16());

        if !response.status().is_success() {
            return Err(ApiError::UploadRejected(status_text(response.status())));
        }

        decode(response).await
    }
}

/// Reason phrase for a status, falling back to the numeric code
fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ApiError::DecodeError(e.to_string()))
}

#[async_trait]
impl Uploader for HttpApiClient {
    async fn upload(
        &self,
        category: Category,
        file: FileCandidate,
    ) -> Result<UploadResponse, UploadFailure> {
        self.upload_file(category, file)
            .await
            .map_err(UploadFailure::from)
    }
}

#[async_trait]
impl DatasetApi for HttpApiClient {
    async fn datasets(&self) -> Result<Vec<Dataset>, ApiError> {
        let list: DatasetList = self.get_json("/datasets", &[]).await?;
        Ok(list.datasets)
    }

    async fn chest_xray_statistics(&self) -> Result<ChestXrayStats, ApiError> {
        self.get_json("/datasets/chest-xray/statistics", &[]).await
    }

    async fn tiny_imagenet_statistics(&self) -> Result<TinyImageNetStats, ApiError> {
        self.get_json("/datasets/tiny-imagenet/statistics", &[])
            .await
    }

    async fn chest_xray_samples(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<DatasetSample>, ApiError> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        let list: SampleList = self
            .get_json("/datasets/chest-xray/samples", &query)
            .await?;
        Ok(list.samples)
    }

    async fn tiny_imagenet_classes(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ImageClass>, ApiError> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        let list: ClassList = self
            .get_json("/datasets/tiny-imagenet/classes", &query)
            .await?;
        Ok(list.classes)
    }

    async fn tiny_imagenet_samples(
        &self,
        class_id: &str,
        limit: u32,
    ) -> Result<Vec<TinyImageNetSample>, ApiError> {
        let url = self.resource_url("/datasets/tiny-imagenet/samples", class_id)?;
        let query = [("limit", limit.to_string())];
        let list: TinyImageNetSampleList = self
            .fetch_json("/datasets/tiny-imagenet/samples/{class_id}", url, &query)
            .await?;
        Ok(list.samples)
    }

    async fn kitti_sequences(&self) -> Result<Vec<KittiSequence>, ApiError> {
        let list: SequenceList = self.get_json("/datasets/kitti/sequences", &[]).await?;
        Ok(list.sequences)
    }

    async fn kitti_sequence(&self, sequence_id: &str) -> Result<KittiSequenceDetail, ApiError> {
        let url = self.resource_url("/datasets/kitti/sequence", sequence_id)?;
        self.fetch_json("/datasets/kitti/sequence/{id}", url, &[])
            .await
    }

    async fn kitti_frames(
        &self,
        sequence_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<KittiFrame>, ApiError> {
        let url = self.resource_url("/datasets/kitti/frames", sequence_id)?;
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        let list: FrameList = self
            .fetch_json("/datasets/kitti/frames/{id}", url, &query)
            .await?;
        Ok(list.frames)
    }
}
