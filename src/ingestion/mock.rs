use super::sink::{LogSink, SinkFuture, StreamTarget};
use crate::error::IngestionError;
use crate::records::LogBatch;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A delivery observed by [`MockSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub endpoint: String,
    pub rule_id: String,
    pub stream: String,
    pub records: usize,
}

/// In-memory ingestion destination for testing
///
/// Records every delivery; streams can be scripted to fail or to respond slowly.
#[derive(Debug, Clone, Default)]
pub struct MockSink {
    failures: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl MockSink {
    /// A sink that accepts everything
    pub fn success() -> Self {
        Self::default()
    }

    /// Fail deliveries to `stream` with the given message
    pub fn failing_on(mut self, stream: &str, message: &str) -> Self {
        self.failures.insert(stream.to_string(), message.to_string());
        self
    }

    /// Delay deliveries to `stream`
    pub fn with_delay(mut self, stream: &str, delay: Duration) -> Self {
        self.delays.insert(stream.to_string(), delay);
        self
    }

    /// Deliveries attempted so far, in arrival order
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn delivery_to(&self, stream: &str) -> Option<Delivery> {
        self.deliveries().into_iter().find(|d| d.stream == stream)
    }
}

impl LogSink for MockSink {
    fn send_logs<'a>(&'a self, target: StreamTarget<'a>, batch: &'a LogBatch) -> SinkFuture<'a> {
        Box::pin(async move {
            self.deliveries.lock().unwrap().push(Delivery {
                endpoint: target.endpoint.to_string(),
                rule_id: target.rule_id.to_string(),
                stream: target.stream.to_string(),
                records: batch.len(),
            });

            if let Some(delay) = self.delays.get(target.stream) {
                tokio::time::sleep(*delay).await;
            }

            match self.failures.get(target.stream) {
                Some(message) => Err(IngestionError::HttpStatus {
                    status: "500 Internal Server Error".to_string(),
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        })
    }
}
