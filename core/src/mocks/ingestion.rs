//! Mock ingestion service for testing.

use crate::error::{IntakeError, Result};
use crate::ingestion::{IngestCustomEvent, IngestionService};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock ingestion service.
///
/// Records every request it receives.
#[derive(Debug, Clone, Default)]
pub struct MockIngestionService {
    received: Arc<Mutex<Vec<IngestCustomEvent>>>,
    fail_with: Option<IntakeError>,
}

impl MockIngestionService {
    /// Create a mock that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `error` (the request is still recorded).
    #[must_use]
    pub fn failing(mut self, error: IntakeError) -> Self {
        self.fail_with = Some(error);
        self
    }

    /// Requests received so far.
    #[must_use]
    pub fn received(&self) -> Vec<IngestCustomEvent> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.received.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl IngestionService for MockIngestionService {
    fn ingest(&self, request: IngestCustomEvent) -> impl Future<Output = Result<()>> + Send {
        let received = Arc::clone(&self.received);
        let fail_with = self.fail_with.clone();

        async move {
            received
                .lock()
                .map_err(|_| IntakeError::Internal("mock lock poisoned".to_string()))?
                .push(request);

            fail_with.map_or(Ok(()), Err)
        }
    }
}
