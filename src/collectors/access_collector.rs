use crate::error::SourceError;
use crate::gong::{CallId, GongSource, UsersAccessPage};
use crate::records::{format_timestamp, LogBatch, LogRecord};
use chrono::Utc;
use log::{debug, info};
use std::sync::Arc;

/// Call user-access collector
///
/// Lists every call, then requests the user-access records for those calls.
/// The second request is only issued once the first has succeeded.
pub struct CallAccessCollector {
    source: Arc<dyn GongSource>,
}

impl CallAccessCollector {
    pub fn new(source: Arc<dyn GongSource>) -> Self {
        Self { source }
    }

    /// Fetch the IDs of all calls visible to the credentials
    pub async fn get_call_ids(&self) -> Result<Vec<CallId>, SourceError> {
        let ids = self.source.list_call_ids().await?;
        debug!("Retrieved {} call IDs", ids.len());
        Ok(ids)
    }

    /// Fetch and flatten user-access records for the given calls
    ///
    /// An empty `call_ids` slice still issues the request.
    pub async fn get_user_access(&self, call_ids: &[CallId]) -> Result<LogBatch, SourceError> {
        let page = self.source.users_access(call_ids).await?;
        let time_generated = format_timestamp(Utc::now());
        flatten_access(&page, &time_generated)
    }

    /// Run both stages as one unit
    pub async fn collect(&self) -> Result<LogBatch, SourceError> {
        let call_ids = self.get_call_ids().await?;
        let batch = self.get_user_access(&call_ids).await?;
        info!(
            "Collected {} call access records for {} calls",
            batch.len(),
            call_ids.len()
        );
        Ok(batch)
    }
}

/// Flatten a users-access response into `{TimeGenerated, requestId, callAccessList}` records
pub fn flatten_access(
    page: &UsersAccessPage,
    time_generated: &str,
) -> Result<LogBatch, SourceError> {
    page.call_access_list
        .iter()
        .map(|entry| {
            let encoded = serde_json::to_string(entry).map_err(|e| {
                SourceError::Decode(format!("Failed to encode call access entry: {}", e))
            })?;
            Ok(LogRecord::new(time_generated)
                .with("requestId", page.request_id.as_str())
                .with("callAccessList", encoded))
        })
        .collect()
}
