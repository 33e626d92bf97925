use crate::error::SourceError;
use crate::gong::GongSource;
use crate::records::{format_timestamp, LogBatch, LogRecord};
use crate::registry::LogTypeRegistry;
use chrono::{Duration, Utc};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;

/// Audit log collector for every registered Gong log type
///
/// Issues one time-windowed `/v2/logs` request per log type and flattens the
/// entries into `{TimeGenerated, logType, logEntry}` records. Either all types
/// are collected or the first failure is returned and nothing else.
pub struct AuditLogCollector {
    source: Arc<dyn GongSource>,
    registry: Arc<LogTypeRegistry>,
}

impl AuditLogCollector {
    /// Create a collector over the given source and registry
    pub fn new(source: Arc<dyn GongSource>, registry: Arc<LogTypeRegistry>) -> Self {
        Self { source, registry }
    }

    /// Collect every registered log type newer than `now - lookup_window`
    ///
    /// # Errors
    ///
    /// Returns `SourceError::InvalidWindow` without touching the network if
    /// `lookup_window` is not strictly positive or reaches past the earliest
    /// representable instant. Any other error comes from the first log type
    /// that failed.
    pub async fn collect(&self, lookup_window: Duration) -> Result<LogBatch, SourceError> {
        if lookup_window <= Duration::zero() {
            return Err(SourceError::InvalidWindow(lookup_window));
        }

        let from = Utc::now()
            .checked_sub_signed(lookup_window)
            .ok_or(SourceError::InvalidWindow(lookup_window))?;
        let from_date_time = format_timestamp(from);
        let mut combined = LogBatch::new();

        for log_type in self.registry.types() {
            let batch = self.collect_type(log_type, &from_date_time).await?;
            debug!("Collected {} {} records", batch.len(), log_type);
            combined.extend(batch);
        }

        info!(
            "Collected {} audit records across {} log types",
            combined.len(),
            self.registry.len()
        );
        Ok(combined)
    }

    async fn collect_type(
        &self,
        log_type: &str,
        from_date_time: &str,
    ) -> Result<LogBatch, SourceError> {
        let page = match self.source.fetch_logs(log_type, from_date_time).await {
            Ok(page) => page,
            Err(SourceError::Api { errors, .. }) => {
                if errors.iter().any(|e| is_no_records_message(e)) {
                    warn!(
                        "No {} records found for the provided time range",
                        log_type
                    );
                    return Ok(LogBatch::new());
                }
                let message = errors.into_iter().next().unwrap_or_default();
                return Err(SourceError::LogType {
                    log_type: log_type.to_string(),
                    message,
                });
            }
            Err(e) => return Err(e),
        };

        if let Some(cursor) = page.cursor() {
            let total = page
                .records
                .as_ref()
                .and_then(|r| r.total_records)
                .map(|t| t.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            warn!(
                "{} has more pages (total records: {}, cursor: {}); only the first page is kept",
                log_type, total, cursor
            );
        }

        let time_generated = format_timestamp(Utc::now());
        flatten_entries(log_type, &page.log_entries, &time_generated)
    }
}

/// Whether a Gong error message means "nothing in this window" rather than a failure
pub fn is_no_records_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower
        .find("no log records found")
        .map(|start| lower[start..].contains("time range"))
        .unwrap_or(false)
}

/// Flatten raw log entries into records sharing one `TimeGenerated`
pub fn flatten_entries(
    log_type: &str,
    entries: &[Value],
    time_generated: &str,
) -> Result<LogBatch, SourceError> {
    entries
        .iter()
        .map(|entry| {
            let encoded = serde_json::to_string(entry)
                .map_err(|e| SourceError::Decode(format!("Failed to encode log entry: {}", e)))?;
            Ok(LogRecord::new(time_generated)
                .with("logType", log_type)
                .with("logEntry", encoded))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gong::{LogsPage, MockFailure, MockSource, PageRecords};
    use crate::registry::LogTypeDescriptor;
    use serde_json::json;

    const NO_RECORDS: &str =
        "No log records found corresponding to the provided log type and time range";

    fn collector(source: &MockSource) -> AuditLogCollector {
        AuditLogCollector::new(
            Arc::new(source.clone()),
            Arc::new(LogTypeRegistry::builtin()),
        )
    }

    #[test]
    fn test_no_records_message_detection() {
        assert!(is_no_records_message(NO_RECORDS));
        assert!(is_no_records_message(
            "no log records found for the given time range"
        ));
        assert!(!is_no_records_message("Unauthorized"));
        assert!(!is_no_records_message("time range no log records found"));
    }

    #[test]
    fn test_flatten_round_trip() {
        let entries = vec![json!({"a": 1}), json!({"a": 2})];
        let batch = flatten_entries("AccessLog", &entries, "2024-01-01T00:00:00Z").unwrap();

        assert_eq!(batch.len(), 2);
        for (record, original) in batch.records().iter().zip(&entries) {
            assert_eq!(record.time_generated(), Some("2024-01-01T00:00:00Z"));
            assert_eq!(record.get("logType"), Some("AccessLog"));
            let decoded: Value = serde_json::from_str(record.get("logEntry").unwrap()).unwrap();
            assert_eq!(&decoded, original);
        }
    }

    #[tokio::test]
    async fn test_collect_round_trip_shares_time_generated() {
        let source =
            MockSource::new().with_entries("AccessLog", vec![json!({"a": 1}), json!({"a": 2})]);

        let batch = collector(&source).collect(Duration::hours(24)).await.unwrap();

        assert_eq!(batch.len(), 2);
        let records = batch.records();
        assert_eq!(records[0].time_generated(), records[1].time_generated());
        assert_eq!(records[0].get("logEntry"), Some(r#"{"a":1}"#));
        assert_eq!(records[1].get("logEntry"), Some(r#"{"a":2}"#));
    }

    #[tokio::test]
    async fn test_collect_queries_every_registered_type() {
        let source = MockSource::new();
        collector(&source).collect(Duration::hours(1)).await.unwrap();

        let registry = LogTypeRegistry::builtin();
        let expected: Vec<String> = registry.types().map(String::from).collect();
        assert_eq!(source.fetched_log_types(), expected);
    }

    #[tokio::test]
    async fn test_collect_sums_per_type_counts() {
        let source = MockSource::new()
            .with_entries("AccessLog", vec![json!({"a": 1}), json!({"a": 2})])
            .with_entries("UserCallPlay", vec![json!({"b": 1})])
            .with_entries(
                "ExternallySharedCallPlay",
                vec![json!({"c": 1}), json!({"c": 2}), json!({"c": 3})],
            );

        let batch = collector(&source).collect(Duration::hours(1)).await.unwrap();
        assert_eq!(batch.len(), 6);

        let play: Vec<_> = batch
            .records()
            .iter()
            .filter(|r| r.get("logType") == Some("ExternallySharedCallPlay"))
            .map(|r| r.get("logEntry").unwrap().to_string())
            .collect();
        assert_eq!(play, vec![r#"{"c":1}"#, r#"{"c":2}"#, r#"{"c":3}"#]);
    }

    #[tokio::test]
    async fn test_no_records_error_yields_empty_type() {
        let source = MockSource::new()
            .with_logs_failure("AccessLog", MockFailure::Api(vec![NO_RECORDS.to_string()]))
            .with_entries("UserActivityLog", vec![json!({"x": true})]);

        let batch = collector(&source).collect(Duration::hours(1)).await.unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.records()[0].get("logType"), Some("UserActivityLog"));
        assert_eq!(source.fetched_log_types().len(), 5);
    }

    #[tokio::test]
    async fn test_other_api_error_fails_whole_collection() {
        let source = MockSource::new()
            .with_entries("AccessLog", vec![json!({"a": 1})])
            .with_logs_failure(
                "UserActivityLog",
                MockFailure::Api(vec!["Access denied".to_string(), NO_RECORDS.to_string()]),
            );

        let result = collector(&source).collect(Duration::hours(1)).await;

        // a no-records message anywhere in the envelope means empty
        assert!(result.is_ok());

        let source = MockSource::new()
            .with_entries("AccessLog", vec![json!({"a": 1})])
            .with_logs_failure(
                "UserActivityLog",
                MockFailure::Api(vec!["Access denied".to_string(), "Quota".to_string()]),
            );

        let err = collector(&source)
            .collect(Duration::hours(1))
            .await
            .unwrap_err();
        match err {
            SourceError::LogType { log_type, message } => {
                assert_eq!(log_type, "UserActivityLog");
                assert_eq!(message, "Access denied");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // collection stops at the failing type
        assert_eq!(source.fetched_log_types(), vec!["AccessLog", "UserActivityLog"]);
    }

    #[tokio::test]
    async fn test_status_error_propagates_unchanged() {
        let source = MockSource::new().with_logs_failure(
            "UserCallPlay",
            MockFailure::Status("503 Service Unavailable".to_string()),
        );

        let err = collector(&source)
            .collect(Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::HttpStatus { .. }));
    }

    #[tokio::test]
    async fn test_non_positive_window_rejected_before_network() {
        let source = MockSource::new().with_entries("AccessLog", vec![json!({"a": 1})]);

        for window in [Duration::zero(), Duration::hours(-3)] {
            let err = collector(&source).collect(window).await.unwrap_err();
            assert!(matches!(err, SourceError::InvalidWindow(_)));
        }
        assert!(source.fetched_log_types().is_empty());
    }

    #[tokio::test]
    async fn test_unrepresentable_window_rejected_before_network() {
        let source = MockSource::new().with_entries("AccessLog", vec![json!({"a": 1})]);
        let window = Duration::hours(100_000_000_000);

        let err = collector(&source).collect(window).await.unwrap_err();

        match err {
            SourceError::InvalidWindow(rejected) => assert_eq!(rejected, window),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(source.fetched_log_types().is_empty());
    }

    #[tokio::test]
    async fn test_cursor_does_not_change_collected_entries() {
        let page = LogsPage {
            request_id: Some("r".to_string()),
            records: Some(PageRecords {
                total_records: Some(500),
                cursor: Some("next".to_string()),
                ..PageRecords::default()
            }),
            log_entries: vec![json!({"a": 1})],
        };
        let source = MockSource::new().with_page("AccessLog", page);

        let batch = collector(&source).collect(Duration::hours(1)).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(source.fetched_log_types().len(), 5);
    }

    #[tokio::test]
    async fn test_custom_registry_drives_collection() {
        let source = MockSource::new().with_entries("NewAuditType", vec![json!({"n": 1})]);
        let registry = LogTypeRegistry::from_descriptors(vec![LogTypeDescriptor {
            name: "NewAuditType",
            schema: "n",
        }]);
        let collector = AuditLogCollector::new(Arc::new(source.clone()), Arc::new(registry));

        let batch = collector.collect(Duration::minutes(30)).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(source.fetched_log_types(), vec!["NewAuditType"]);
    }
}
