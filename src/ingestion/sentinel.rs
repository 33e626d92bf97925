use super::sink::{LogSink, SinkFuture, StreamTarget};
use crate::error::IngestionError;
use crate::records::LogBatch;
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Default Microsoft Entra ID authority
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

const MONITOR_SCOPE: &str = "https://monitor.azure.com//.default";
const INGESTION_API_VERSION: &str = "2023-01-01";

/// Logs Ingestion API rejects calls above 1 MB
const MAX_PAYLOAD_BYTES: usize = 1_000_000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Service principal used to obtain ingestion tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Azure Monitor Logs Ingestion client feeding Microsoft Sentinel tables
///
/// Every delivery obtains a client-credentials token, then posts the batch as
/// one or more JSON arrays to the data collection rule stream.
pub struct SentinelClient {
    client: Client,
    credentials: Credentials,
    authority: String,
}

impl SentinelClient {
    /// Create a client against the public Entra ID authority
    pub fn new(credentials: Credentials) -> Result<Self, IngestionError> {
        Self::with_authority(credentials, DEFAULT_AUTHORITY.to_string())
    }

    /// Create a client against a custom token authority
    pub fn with_authority(
        credentials: Credentials,
        authority: String,
    ) -> Result<Self, IngestionError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            credentials,
            authority,
        })
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority.trim_end_matches('/'),
            self.credentials.tenant_id
        )
    }

    fn upload_url(target: &StreamTarget<'_>) -> String {
        format!(
            "{}/dataCollectionRules/{}/streams/{}?api-version={}",
            target.endpoint.trim_end_matches('/'),
            target.rule_id,
            target.stream,
            INGESTION_API_VERSION
        )
    }

    async fn access_token(&self) -> Result<String, IngestionError> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", MONITOR_SCOPE),
        ];

        let response = self
            .client
            .post(self.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| IngestionError::Auth(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IngestionError::Auth(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IngestionError::Auth(format!("invalid token response: {}", e)))?;
        Ok(token.access_token)
    }

    async fn upload(
        &self,
        url: &str,
        token: &str,
        payload: String,
    ) -> Result<(), IngestionError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().to_string();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(IngestionError::HttpStatus { status, message });
        }
        Ok(())
    }
}

/// Split a batch into JSON array payloads no larger than `max_bytes`
///
/// A single record above the limit is sent on its own.
fn chunk_payloads(batch: &LogBatch, max_bytes: usize) -> Result<Vec<String>, IngestionError> {
    let mut payloads = Vec::new();
    let mut current = String::from("[");

    for record in batch.records() {
        let encoded = serde_json::to_string(record)?;
        // separator plus closing bracket
        let needed = encoded.len() + 2;
        if current.len() > 1 && current.len() + needed > max_bytes {
            current.push(']');
            payloads.push(std::mem::replace(&mut current, String::from("[")));
        }
        if current.len() > 1 {
            current.push(',');
        }
        current.push_str(&encoded);
    }

    if current.len() > 1 {
        current.push(']');
        payloads.push(current);
    }
    Ok(payloads)
}

impl LogSink for SentinelClient {
    fn send_logs<'a>(&'a self, target: StreamTarget<'a>, batch: &'a LogBatch) -> SinkFuture<'a> {
        Box::pin(async move {
            if batch.is_empty() {
                info!("No records to send to stream {}", target.stream);
                return Ok(());
            }

            let payloads = chunk_payloads(batch, MAX_PAYLOAD_BYTES)?;
            let token = self.access_token().await?;
            let url = Self::upload_url(&target);

            let chunks = payloads.len();
            for (i, payload) in payloads.into_iter().enumerate() {
                debug!(
                    "Uploading chunk {}/{} ({} bytes) to stream {}",
                    i + 1,
                    chunks,
                    payload.len(),
                    target.stream
                );
                self.upload(&url, &token, payload).await?;
            }

            info!(
                "Sent {} records to stream {} in {} request(s)",
                batch.len(),
                target.stream,
                chunks
            );
            Ok(())
        })
    }
}
