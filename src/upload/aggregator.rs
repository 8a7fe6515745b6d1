//! Result aggregation
//!
//! At the end of each upload run the results of every completed entry in the
//! session (including those completed by earlier runs) are gathered and handed
//! to the consumer, once, and only when there is at least one.

use super::registry::Session;
use crate::api::UploadResponse;
use std::sync::Arc;

/// Results of every completed entry, in session order.
pub fn collect_results(session: &Session) -> Vec<UploadResponse> {
    session
        .iter()
        .filter_map(|entry| entry.result().cloned())
        .collect()
}

/// Receives aggregated results after a run
pub trait ResultConsumer: Send + Sync {
    fn on_upload_complete(&self, results: Vec<UploadResponse>);
}

impl<F> ResultConsumer for F
where
    F: Fn(Vec<UploadResponse>) + Send + Sync,
{
    fn on_upload_complete(&self, results: Vec<UploadResponse>) {
        self(results)
    }
}

/// Emits collected results to an optional consumer
#[derive(Clone, Default)]
pub struct ResultAggregator {
    consumer: Option<Arc<dyn ResultConsumer>>,
}

impl ResultAggregator {
    pub fn new<C: ResultConsumer + 'static>(consumer: C) -> Self {
        Self {
            consumer: Some(Arc::new(consumer)),
        }
    }

    /// Collect results and notify the consumer if there are any.
    pub fn on_run_complete(&self, session: &Session) -> Vec<UploadResponse> {
        let results = collect_results(session);
        if results.is_empty() {
            return results;
        }

        if let Some(consumer) = &self.consumer {
            tracing::debug!(results = results.len(), "Delivering upload results");
            consumer.on_upload_complete(results.clone());
        }
        results
    }
}

impl std::fmt::Debug for ResultAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultAggregator")
            .field("has_consumer", &self.consumer.is_some())
            .finish()
    }
}
