/// Gong REST API client and test double
pub mod client;
pub mod mock;

pub use client::{CallId, GongClient, GongSource, LogsPage, PageRecords, UsersAccessPage};
pub use mock::{MockFailure, MockSource};
