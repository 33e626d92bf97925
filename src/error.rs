use thiserror::Error;

/// Errors that can occur while talking to the Gong REST API
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gong API returned {status}: {message}")]
    HttpStatus { status: String, message: String },

    #[error("Gong API returned {status} with errors: {}", .errors.join("; "))]
    Api { status: String, errors: Vec<String> },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to fetch audit logs for {log_type}: {message}")]
    LogType { log_type: String, message: String },

    #[error("Invalid lookup window, should be a positive duration: {0}")]
    InvalidWindow(chrono::Duration),
}

/// Errors that can occur when delivering logs to the ingestion endpoint
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Failed to acquire access token: {0}")]
    Auth(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Ingestion endpoint returned {status}: {message}")]
    HttpStatus { status: String, message: String },

    #[error("Failed to encode log batch: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Run-fatal errors surfaced by the collection and ingestion stages
///
/// Carries the identity of the unit that failed so the entrypoint can report it.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to retrieve {unit}: {source}")]
    Collection {
        unit: crate::collectors::CollectionUnit,
        #[source]
        source: SourceError,
    },

    #[error("Failed to ship logs to stream {stream}: {source}")]
    Ingestion {
        stream: String,
        #[source]
        source: IngestionError,
    },

    #[error("Task retrieving {unit} did not complete: {message}")]
    CollectionTask {
        unit: crate::collectors::CollectionUnit,
        message: String,
    },

    #[error("Task shipping logs to stream {stream} did not complete: {message}")]
    IngestionTask { stream: String, message: String },
}
