use super::sink::{LogSink, StreamTarget};
use crate::error::{IngestionError, PipelineError};
use crate::orchestrator::CollectedLogs;
use crate::records::LogBatch;
use log::info;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Where each batch is delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub endpoint: String,
    pub rule_id: String,
    /// Stream receiving audit log records
    pub audit_stream: String,
    /// Stream receiving call user-access records
    pub access_stream: String,
}

/// Ships collected batches to their streams concurrently
///
/// Both deliveries start at once. The first failure is returned as soon as it
/// arrives; success is reported only after both deliveries complete.
pub struct IngestionRouter {
    sink: Arc<dyn LogSink>,
    destination: Arc<Destination>,
}

impl IngestionRouter {
    pub fn new(sink: Arc<dyn LogSink>, destination: Destination) -> Self {
        Self {
            sink,
            destination: Arc::new(destination),
        }
    }

    /// Deliver the audit and access batches
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Ingestion` naming the stream whose delivery
    /// failed first.
    pub async fn ship(&self, logs: CollectedLogs) -> Result<(), PipelineError> {
        let CollectedLogs { audit, access } = logs;

        let audit_stream = self.destination.audit_stream.clone();
        let access_stream = self.destination.access_stream.clone();

        let audit_task = self.spawn_delivery(audit_stream.clone(), audit, "audit");
        let access_task = self.spawn_delivery(access_stream.clone(), access, "user access");

        info!("Waiting for log ingestion to finish");
        tokio::try_join!(
            join_delivery(audit_stream, audit_task),
            join_delivery(access_stream, access_task),
        )?;

        info!("Finished ingesting logs");
        Ok(())
    }

    fn spawn_delivery(
        &self,
        stream: String,
        batch: LogBatch,
        kind: &'static str,
    ) -> JoinHandle<Result<(), IngestionError>> {
        let sink = Arc::clone(&self.sink);
        let destination = Arc::clone(&self.destination);

        tokio::spawn(async move {
            info!(
                "Shipping {} Gong {} records to stream {}",
                batch.len(),
                kind,
                stream
            );
            let target = StreamTarget {
                endpoint: &destination.endpoint,
                rule_id: &destination.rule_id,
                stream: &stream,
            };
            let result = sink.send_logs(target, &batch).await;
            if result.is_ok() {
                info!("Successfully sent Gong {} records to stream {}", kind, stream);
            }
            result
        })
    }
}

async fn join_delivery(
    stream: String,
    task: JoinHandle<Result<(), IngestionError>>,
) -> Result<(), PipelineError> {
    let result = task.await.map_err(|e| PipelineError::IngestionTask {
        stream: stream.clone(),
        message: e.to_string(),
    })?;
    result.map_err(|source| PipelineError::Ingestion { stream, source })
}
