use std::fmt;

/// Audit log collector for the registered Gong log types
pub mod audit_collector;

/// Two-stage call user-access collector
pub mod access_collector;

pub use access_collector::CallAccessCollector;
pub use audit_collector::AuditLogCollector;

/// Identity of a collection unit, reported with its failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionUnit {
    AuditLogs,
    CallAccess,
}

impl fmt::Display for CollectionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionUnit::AuditLogs => write!(f, "Gong audit logs"),
            CollectionUnit::CallAccess => write!(f, "Gong user access logs"),
        }
    }
}
