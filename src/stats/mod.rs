//! Dataset statistics board
//!
//! Loads the chest X-ray and Tiny-ImageNet statistics together. When either
//! request fails the board keeps the error message and shows the published
//! reference figures instead, so callers always have something to render.

use crate::api::{ChestXrayStats, DatasetApi, TinyImageNetStats};
use serde::Serialize;

/// Statistics view with fallback and retry
pub struct StatsBoard<A> {
    api: A,
    chest_xray: Option<ChestXrayStats>,
    tiny_imagenet: Option<TinyImageNetStats>,
    error: Option<String>,
    retry_count: u32,
}

/// Serializable view of the board
#[derive(Debug, Serialize)]
pub struct StatsView<'a> {
    pub chest_xray: Option<&'a ChestXrayStats>,
    pub tiny_imagenet: Option<&'a TinyImageNetStats>,
    pub error: Option<&'a str>,
    pub fallback: bool,
    pub retry_count: u32,
}

impl<A: DatasetApi> StatsBoard<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            chest_xray: None,
            tiny_imagenet: None,
            error: None,
            retry_count: 0,
        }
    }

    /// Fetch both statistics documents concurrently.
    ///
    /// Either failure replaces both with the reference figures.
    #[tracing::instrument(name = "stats.load", skip(self), fields(retry = self.retry_count))]
    pub async fn load(&mut self) {
        let result = tokio::try_join!(
            self.api.chest_xray_statistics(),
            self.api.tiny_imagenet_statistics()
        );

        match result {
            Ok((chest_xray, tiny_imagenet)) => {
                self.chest_xray = Some(chest_xray);
                self.tiny_imagenet = Some(tiny_imagenet);
                self.error = None;
                self.retry_count = 0;
                tracing::debug!("Dataset statistics loaded");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load dataset statistics, using reference figures");
                self.error = Some(e.to_string());
                self.chest_xray = Some(ChestXrayStats::reference());
                self.tiny_imagenet = Some(TinyImageNetStats::reference());
            }
        }
    }

    /// Clear the error and load again
    pub async fn retry(&mut self) {
        self.retry_count += 1;
        self.error = None;
        self.load().await;
    }

    pub fn chest_xray(&self) -> Option<&ChestXrayStats> {
        self.chest_xray.as_ref()
    }

    pub fn tiny_imagenet(&self) -> Option<&TinyImageNetStats> {
        self.tiny_imagenet.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// True while the shown figures are the reference ones
    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }

    pub fn view(&self) -> StatsView<'_> {
        StatsView {
            chest_xray: self.chest_xray(),
            tiny_imagenet: self.tiny_imagenet(),
            error: self.error(),
            fallback: self.is_fallback(),
            retry_count: self.retry_count,
        }
    }
}
