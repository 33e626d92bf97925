//! Concurrent collection of audit and call-access logs
//!
//! Both collectors run as independent tasks. The first failure to arrive ends
//! the wait immediately; otherwise both batches are returned once both tasks
//! have finished. A failing task does not cancel its sibling, the sibling's
//! result is simply never consumed.

use crate::collectors::{AuditLogCollector, CallAccessCollector, CollectionUnit};
use crate::error::{PipelineError, SourceError};
use crate::gong::GongSource;
use crate::records::LogBatch;
use crate::registry::LogTypeRegistry;
use chrono::Duration;
use log::info;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Batches produced by one collection run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedLogs {
    pub audit: LogBatch,
    pub access: LogBatch,
}

/// Runs the audit and call-access collectors side by side
pub struct CollectionOrchestrator {
    source: Arc<dyn GongSource>,
    registry: Arc<LogTypeRegistry>,
    lookup_window: Duration,
}

impl CollectionOrchestrator {
    /// Create an orchestrator
    ///
    /// # Arguments
    ///
    /// * `source` - Gong API shared by both collectors
    /// * `registry` - Log types the audit collector requests
    /// * `lookup_window` - How far back audit logs are requested
    pub fn new(
        source: Arc<dyn GongSource>,
        registry: Arc<LogTypeRegistry>,
        lookup_window: Duration,
    ) -> Self {
        Self {
            source,
            registry,
            lookup_window,
        }
    }

    /// Collect both batches, failing fast on the first unit error
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Collection` tagged with the failing unit. When
    /// both units fail, whichever failure is observed first is returned.
    pub async fn collect(&self) -> Result<CollectedLogs, PipelineError> {
        let audit_collector =
            AuditLogCollector::new(Arc::clone(&self.source), Arc::clone(&self.registry));
        let lookup_window = self.lookup_window;
        let audit_task = tokio::spawn(async move {
            info!("Retrieving Gong audit logs");
            audit_collector.collect(lookup_window).await
        });

        let access_collector = CallAccessCollector::new(Arc::clone(&self.source));
        let access_task = tokio::spawn(async move {
            info!("Retrieving Gong user access logs");
            access_collector.collect().await
        });

        info!("Waiting for log retrieval to finish");
        let (audit, access) = tokio::try_join!(
            join_unit(CollectionUnit::AuditLogs, audit_task),
            join_unit(CollectionUnit::CallAccess, access_task),
        )?;

        info!(
            "Finished retrieving logs ({} audit, {} user access)",
            audit.len(),
            access.len()
        );
        Ok(CollectedLogs { audit, access })
    }
}

async fn join_unit(
    unit: CollectionUnit,
    task: JoinHandle<Result<LogBatch, SourceError>>,
) -> Result<LogBatch, PipelineError> {
    task.await
        .map_err(|e| PipelineError::CollectionTask {
            unit,
            message: e.to_string(),
        })?
        .map_err(|source| PipelineError::Collection { unit, source })
}
