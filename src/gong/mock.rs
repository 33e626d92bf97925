use super::client::{CallId, GongSource, LogsPage, SourceFuture, UsersAccessPage};
use crate::error::SourceError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted failure returned by [`MockSource`]
#[derive(Debug, Clone)]
pub enum MockFailure {
    /// Non-success status with a decoded error envelope
    Api(Vec<String>),
    /// Non-success status without an envelope
    Status(String),
    /// Malformed response body
    Decode(String),
}

impl MockFailure {
    fn to_error(&self) -> SourceError {
        match self {
            MockFailure::Api(errors) => SourceError::Api {
                status: "404 Not Found".to_string(),
                errors: errors.clone(),
            },
            MockFailure::Status(status) => SourceError::HttpStatus {
                status: status.clone(),
                message: String::new(),
            },
            MockFailure::Decode(message) => SourceError::Decode(message.clone()),
        }
    }
}

type Scripted<T> = Result<T, MockFailure>;

/// In-memory Gong API for testing
///
/// Log types without a scripted response return an empty page.
#[derive(Debug, Clone)]
pub struct MockSource {
    logs: HashMap<String, Scripted<LogsPage>>,
    call_ids: Scripted<Vec<CallId>>,
    access: Scripted<UsersAccessPage>,
    logs_delay: Option<Duration>,
    calls_delay: Option<Duration>,
    fetch_logs_calls: Arc<Mutex<Vec<String>>>,
    list_call_ids_calls: Arc<Mutex<usize>>,
    users_access_calls: Arc<Mutex<Vec<Vec<CallId>>>>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    /// A source with no log entries, no calls and an empty access list
    pub fn new() -> Self {
        Self {
            logs: HashMap::new(),
            call_ids: Ok(Vec::new()),
            access: Ok(UsersAccessPage::default()),
            logs_delay: None,
            calls_delay: None,
            fetch_logs_calls: Arc::new(Mutex::new(Vec::new())),
            list_call_ids_calls: Arc::new(Mutex::new(0)),
            users_access_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script the entries returned for a log type
    pub fn with_entries(mut self, log_type: &str, entries: Vec<Value>) -> Self {
        let page = LogsPage {
            log_entries: entries,
            ..LogsPage::default()
        };
        self.logs.insert(log_type.to_string(), Ok(page));
        self
    }

    /// Script a full page, including paging metadata, for a log type
    pub fn with_page(mut self, log_type: &str, page: LogsPage) -> Self {
        self.logs.insert(log_type.to_string(), Ok(page));
        self
    }

    /// Script a failure for a log type
    pub fn with_logs_failure(mut self, log_type: &str, failure: MockFailure) -> Self {
        self.logs.insert(log_type.to_string(), Err(failure));
        self
    }

    pub fn with_call_ids(mut self, ids: Vec<&str>) -> Self {
        self.call_ids = Ok(ids.into_iter().map(String::from).collect());
        self
    }

    pub fn with_call_ids_failure(mut self, failure: MockFailure) -> Self {
        self.call_ids = Err(failure);
        self
    }

    pub fn with_access(mut self, request_id: &str, entries: Vec<Value>) -> Self {
        self.access = Ok(UsersAccessPage {
            request_id: request_id.to_string(),
            call_access_list: entries,
        });
        self
    }

    pub fn with_access_failure(mut self, failure: MockFailure) -> Self {
        self.access = Err(failure);
        self
    }

    /// Delay every `fetch_logs` response
    pub fn with_logs_delay(mut self, delay: Duration) -> Self {
        self.logs_delay = Some(delay);
        self
    }

    /// Delay every calls and users-access response
    pub fn with_calls_delay(mut self, delay: Duration) -> Self {
        self.calls_delay = Some(delay);
        self
    }

    /// Log types requested so far, in request order
    pub fn fetched_log_types(&self) -> Vec<String> {
        self.fetch_logs_calls.lock().unwrap().clone()
    }

    pub fn list_call_ids_count(&self) -> usize {
        *self.list_call_ids_calls.lock().unwrap()
    }

    pub fn users_access_count(&self) -> usize {
        self.users_access_calls.lock().unwrap().len()
    }

    /// Call IDs passed to the most recent users-access request
    pub fn last_access_call_ids(&self) -> Option<Vec<CallId>> {
        self.users_access_calls.lock().unwrap().last().cloned()
    }
}

impl GongSource for MockSource {
    fn fetch_logs<'a>(
        &'a self,
        log_type: &'a str,
        _from_date_time: &'a str,
    ) -> SourceFuture<'a, LogsPage> {
        Box::pin(async move {
            self.fetch_logs_calls
                .lock()
                .unwrap()
                .push(log_type.to_string());

            if let Some(delay) = self.logs_delay {
                tokio::time::sleep(delay).await;
            }

            match self.logs.get(log_type) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(failure)) => Err(failure.to_error()),
                None => Ok(LogsPage::default()),
            }
        })
    }

    fn list_call_ids(&self) -> SourceFuture<'_, Vec<CallId>> {
        Box::pin(async move {
            *self.list_call_ids_calls.lock().unwrap() += 1;

            if let Some(delay) = self.calls_delay {
                tokio::time::sleep(delay).await;
            }

            self.call_ids.clone().map_err(|f| f.to_error())
        })
    }

    fn users_access<'a>(&'a self, call_ids: &'a [CallId]) -> SourceFuture<'a, UsersAccessPage> {
        Box::pin(async move {
            self.users_access_calls
                .lock()
                .unwrap()
                .push(call_ids.to_vec());

            if let Some(delay) = self.calls_delay {
                tokio::time::sleep(delay).await;
            }

            self.access.clone().map_err(|f| f.to_error())
        })
    }
}
