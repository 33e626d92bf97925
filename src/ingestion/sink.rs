use crate::error::IngestionError;
use crate::records::LogBatch;
use std::future::Future;
use std::pin::Pin;

/// Future returned by [`LogSink::send_logs`]
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), IngestionError>> + Send + 'a>>;

/// Routing tuple for one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamTarget<'a> {
    /// Data collection endpoint base URL
    pub endpoint: &'a str,
    /// Immutable ID of the data collection rule
    pub rule_id: &'a str,
    /// Stream declared by the rule, e.g. `Custom-GongAuditLogs`
    pub stream: &'a str,
}

/// Trait for log ingestion destinations
///
/// Implementations own authentication and request shaping; callers only
/// supply where the batch goes.
pub trait LogSink: Send + Sync {
    fn send_logs<'a>(&'a self, target: StreamTarget<'a>, batch: &'a LogBatch) -> SinkFuture<'a>;
}
