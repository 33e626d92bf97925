use crate::error::SourceError;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Default Gong API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.gong.io";

const LOGS_TIMEOUT: Duration = Duration::from_secs(50);
const CALLS_TIMEOUT: Duration = Duration::from_secs(20);

/// Opaque call identifier returned by the calls listing
pub type CallId = String;

/// Future returned by every [`GongSource`] operation
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Read access to the Gong REST API
///
/// Implemented by [`GongClient`] for real traffic and by
/// [`MockSource`](super::MockSource) for tests.
pub trait GongSource: Send + Sync {
    /// `GET /v2/logs` for one log type starting at `from_date_time`
    ///
    /// A non-success response with a decodable error envelope is returned as
    /// [`SourceError::Api`] so the caller can decide whether it means "empty".
    fn fetch_logs<'a>(
        &'a self,
        log_type: &'a str,
        from_date_time: &'a str,
    ) -> SourceFuture<'a, LogsPage>;

    /// `GET /v2/calls`, returning the call IDs in response order
    fn list_call_ids(&self) -> SourceFuture<'_, Vec<CallId>>;

    /// `POST /v2/calls/users-access` for the given call IDs
    fn users_access<'a>(&'a self, call_ids: &'a [CallId]) -> SourceFuture<'a, UsersAccessPage>;
}

/// Paging metadata reported alongside log entries
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageRecords {
    #[serde(default)]
    pub total_records: Option<u64>,
    #[serde(default)]
    pub current_page_size: Option<u64>,
    #[serde(default)]
    pub current_page_number: Option<u64>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Successful `/v2/logs` response; entries are kept as opaque JSON
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogsPage {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub records: Option<PageRecords>,
    #[serde(default)]
    pub log_entries: Vec<Value>,
}

impl LogsPage {
    /// Paging cursor, if the API reported more pages
    pub fn cursor(&self) -> Option<&str> {
        self.records
            .as_ref()
            .and_then(|r| r.cursor.as_deref())
            .filter(|c| !c.is_empty())
    }
}

/// Successful `/v2/calls/users-access` response
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsersAccessPage {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub call_access_list: Vec<Value>,
}

/// Error body returned by Gong on non-success statuses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    #[serde(default)]
    #[allow(dead_code)]
    request_id: Option<String>,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CallsResponse {
    #[serde(default)]
    calls: Vec<CallSummary>,
}

#[derive(Debug, Deserialize)]
struct CallSummary {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UsersAccessRequest<'a> {
    filter: CallIdFilter<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CallIdFilter<'a> {
    call_ids: &'a [CallId],
}

/// HTTP client for the Gong REST API using static basic-auth credentials
pub struct GongClient {
    client: Client,
    base_url: String,
    access_key: String,
    access_secret: String,
}

impl GongClient {
    /// Create a client against the public Gong API
    pub fn new(access_key: String, access_secret: String) -> Result<Self, SourceError> {
        Self::with_base_url(access_key, access_secret, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(
        access_key: String,
        access_secret: String,
        base_url: String,
    ) -> Result<Self, SourceError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url,
            access_key,
            access_secret,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Turn a non-success response into an error, keeping the status text
    async fn status_error(response: Response) -> SourceError {
        let status = response.status().to_string();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        SourceError::HttpStatus { status, message }
    }
}

impl GongSource for GongClient {
    fn fetch_logs<'a>(
        &'a self,
        log_type: &'a str,
        from_date_time: &'a str,
    ) -> SourceFuture<'a, LogsPage> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.url("/v2/logs"))
                .basic_auth(&self.access_key, Some(&self.access_secret))
                .query(&[("logType", log_type), ("fromDateTime", from_date_time)])
                .timeout(LOGS_TIMEOUT)
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;

            if !status.is_success() {
                let envelope: ErrorEnvelope = serde_json::from_str(&body).map_err(|e| {
                    SourceError::Decode(format!("Failed to parse error response: {}", e))
                })?;
                if envelope.errors.is_empty() {
                    return Err(SourceError::HttpStatus {
                        status: status.to_string(),
                        message: body,
                    });
                }
                return Err(SourceError::Api {
                    status: status.to_string(),
                    errors: envelope.errors,
                });
            }

            serde_json::from_str(&body)
                .map_err(|e| SourceError::Decode(format!("Failed to parse logs response: {}", e)))
        })
    }

    fn list_call_ids(&self) -> SourceFuture<'_, Vec<CallId>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.url("/v2/calls"))
                .basic_auth(&self.access_key, Some(&self.access_secret))
                .timeout(CALLS_TIMEOUT)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(Self::status_error(response).await);
            }

            let calls: CallsResponse = response.json().await.map_err(|e| {
                SourceError::Decode(format!("Failed to parse calls response: {}", e))
            })?;

            Ok(calls.calls.into_iter().map(|c| c.id).collect())
        })
    }

    fn users_access<'a>(&'a self, call_ids: &'a [CallId]) -> SourceFuture<'a, UsersAccessPage> {
        Box::pin(async move {
            let request = UsersAccessRequest {
                filter: CallIdFilter { call_ids },
            };

            let response = self
                .client
                .post(self.url("/v2/calls/users-access"))
                .basic_auth(&self.access_key, Some(&self.access_secret))
                .json(&request)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(Self::status_error(response).await);
            }

            response.json().await.map_err(|e| {
                SourceError::Decode(format!("Failed to parse users-access response: {}", e))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    // "key:secret" base64-encoded
    const BASIC_AUTH: &str = "Basic a2V5OnNlY3JldA==";

    fn client_for(server: &mockito::ServerGuard) -> GongClient {
        GongClient::with_base_url("key".to_string(), "secret".to_string(), server.url()).unwrap()
    }

    #[test]
    fn test_url_formatting() {
        let client = GongClient::with_base_url(
            "key".to_string(),
            "secret".to_string(),
            "https://example.gong.io/".to_string(),
        )
        .unwrap();
        assert_eq!(client.url("/v2/calls"), "https://example.gong.io/v2/calls");

        let default = GongClient::new("key".to_string(), "secret".to_string()).unwrap();
        assert_eq!(default.url("/v2/logs"), "https://api.gong.io/v2/logs");
    }

    #[test]
    fn test_logs_page_deserialization() {
        let json = r#"{
            "requestId": "req-1",
            "records": {"totalRecords": 250, "currentPageSize": 100, "currentPageNumber": 0, "cursor": "abc"},
            "logEntries": [{"userId": "1", "logRecord": {"status": 200}}]
        }"#;

        let page: LogsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.request_id.as_deref(), Some("req-1"));
        assert_eq!(page.cursor(), Some("abc"));
        assert_eq!(page.records.unwrap().total_records, Some(250));
        assert_eq!(page.log_entries.len(), 1);
    }

    #[test]
    fn test_empty_cursor_is_ignored() {
        let page: LogsPage =
            serde_json::from_str(r#"{"records": {"cursor": ""}, "logEntries": []}"#).unwrap();
        assert_eq!(page.cursor(), None);
    }

    #[test]
    fn test_users_access_request_shape() {
        let ids = vec!["1".to_string(), "2".to_string()];
        let request = UsersAccessRequest {
            filter: CallIdFilter { call_ids: &ids },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"filter": {"callIds": ["1", "2"]}})
        );
    }

    #[tokio::test]
    async fn test_fetch_logs_sends_query_and_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/logs")
            .match_header("authorization", BASIC_AUTH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("logType".into(), "AccessLog".into()),
                Matcher::UrlEncoded("fromDateTime".into(), "2024-01-01T00:00:00Z".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"requestId": "r", "logEntries": [{"a": 1}, {"a": 2}]}"#)
            .create_async()
            .await;

        let page = client_for(&server)
            .fetch_logs("AccessLog", "2024-01-01T00:00:00Z")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.log_entries, vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[tokio::test]
    async fn test_fetch_logs_returns_error_envelope() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/logs")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"requestId": "r", "errors": ["No log records found corresponding to the provided log type and time range"]}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_logs("UserCallPlay", "2024-01-01T00:00:00Z")
            .await
            .unwrap_err();

        match err {
            SourceError::Api { status, errors } => {
                assert!(status.starts_with("404"));
                assert_eq!(errors.len(), 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_logs_undecodable_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/logs")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_logs("AccessLog", "2024-01-01T00:00:00Z")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[tokio::test]
    async fn test_list_call_ids() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/calls")
            .match_header("authorization", BASIC_AUTH)
            .with_status(200)
            .with_body(r#"{"calls": [{"id": "c1", "title": "x"}, {"id": "c2"}]}"#)
            .create_async()
            .await;

        let ids = client_for(&server).list_call_ids().await.unwrap();
        assert_eq!(ids, vec!["c1".to_string(), "c2".to_string()]);
    }

    #[tokio::test]
    async fn test_list_call_ids_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/calls")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let err = client_for(&server).list_call_ids().await.unwrap_err();
        match err {
            SourceError::HttpStatus { status, message } => {
                assert!(status.contains("401"));
                assert_eq!(message, "unauthorized");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_users_access_posts_filter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/calls/users-access")
            .match_header("authorization", BASIC_AUTH)
            .match_body(Matcher::Json(json!({"filter": {"callIds": []}})))
            .with_status(200)
            .with_body(r#"{"requestId": "r-9", "callAccessList": [{"callId": "c1"}]}"#)
            .create_async()
            .await;

        let page = client_for(&server).users_access(&[]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.request_id, "r-9");
        assert_eq!(page.call_access_list, vec![json!({"callId": "c1"})]);
    }
}
