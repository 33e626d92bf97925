//! Registry of Gong audit log types
//!
//! The registry is the only place that decides which log types are collected.
//! Schemas are carried for documentation; entries are never decoded against them.

/// A known audit log type and the shape of its entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTypeDescriptor {
    /// Identifier passed as the `logType` query parameter
    pub name: &'static str,
    /// Human-readable outline of the `logRecord` payload
    pub schema: &'static str,
}

const ACCESS_LOG: LogTypeDescriptor = LogTypeDescriptor {
    name: "AccessLog",
    schema: "userId, userEmailAddress, userFullName, eventTime, logRecord{response_headers, \
             protocol, method, request_headers, elapsed_time, requested_url, message, mdc, \
             content_length, requested_uri, status}",
};

const USER_ACTIVITY_LOG: LogTypeDescriptor = LogTypeDescriptor {
    name: "UserActivityLog",
    schema: "userId, userEmailAddress, userFullName, eventTime, impersonator*, \
             logRecord{tableChanges[], action, httpRequest, customData[], workspaceId}",
};

const USER_CALL_PLAY: LogTypeDescriptor = LogTypeDescriptor {
    name: "UserCallPlay",
    schema: "userId, userEmailAddress, userFullName, eventTime, logRecord{call_id, \
             video_player_instance_id, sequence_num, play_speed, device, start_time, end_time, \
             event_time_on_device, offline, live}",
};

const EXTERNALLY_SHARED_CALL_ACCESS: LogTypeDescriptor = LogTypeDescriptor {
    name: "ExternallySharedCallAccess",
    schema: "userEmailAddress, userFullName, eventTime, logRecord{call_id, \
             time_based_secure_sharing_id, page_viewer_ip}",
};

const EXTERNALLY_SHARED_CALL_PLAY: LogTypeDescriptor = LogTypeDescriptor {
    name: "ExternallySharedCallPlay",
    schema: "userEmailAddress, userFullName, eventTime, logRecord{time_based_secure_sharing_id, \
             call_id, video_player_instance_id, sequence_num, play_speed, device, start_time, \
             end_time, event_time_on_device, offline, live}",
};

/// Immutable set of log types to collect
#[derive(Debug, Clone)]
pub struct LogTypeRegistry {
    descriptors: Vec<LogTypeDescriptor>,
}

impl Default for LogTypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LogTypeRegistry {
    /// Registry of every audit log type Gong exposes
    pub fn builtin() -> Self {
        Self::from_descriptors(vec![
            ACCESS_LOG,
            USER_ACTIVITY_LOG,
            USER_CALL_PLAY,
            EXTERNALLY_SHARED_CALL_ACCESS,
            EXTERNALLY_SHARED_CALL_PLAY,
        ])
    }

    /// Build a registry from an explicit list; duplicates keep their first occurrence
    pub fn from_descriptors(descriptors: Vec<LogTypeDescriptor>) -> Self {
        let mut unique: Vec<LogTypeDescriptor> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if !unique.iter().any(|d| d.name == descriptor.name) {
                unique.push(descriptor);
            }
        }
        Self {
            descriptors: unique,
        }
    }

    /// Identifiers of every registered log type
    pub fn types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.iter().map(|d| d.name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
