/// Error types for collection, ingestion and configuration
pub mod error;

/// Flattened log records and batches
pub mod records;

/// Registry of Gong audit log types
pub mod registry;

/// Gong REST API client
pub mod gong;

/// Audit and call-access collectors
pub mod collectors;

/// Concurrent collection of both log batches
pub mod orchestrator;

/// Delivery to the Azure Monitor ingestion endpoint
pub mod ingestion;

/// Configuration management
pub mod config;

// Re-export commonly used types
pub use error::{ConfigError, IngestionError, PipelineError, SourceError};
pub use orchestrator::{CollectedLogs, CollectionOrchestrator};
pub use records::{LogBatch, LogRecord};
pub use registry::{LogTypeDescriptor, LogTypeRegistry};
