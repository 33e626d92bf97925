/// Log ingestion: destination trait, Azure Monitor client and routing
pub mod mock;
pub mod router;
pub mod sentinel;
pub mod sink;

pub use mock::{Delivery, MockSink};
pub use router::{Destination, IngestionRouter};
pub use sentinel::{Credentials, SentinelClient};
pub use sink::{LogSink, StreamTarget};
