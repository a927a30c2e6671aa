use serde::Serialize;

/// Capabilities negotiated during session setup. The engine consumes these
/// as constraints and never mutates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionParameters {
    version: u32,
    deliver_partial_objects: bool,
    max_request_id: u64,
}

impl SessionParameters {
    pub fn new(version: u32, deliver_partial_objects: bool, max_request_id: u64) -> Self {
        Self {
            version,
            deliver_partial_objects,
            max_request_id,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Disabled unless explicitly negotiated. The relay only hands out
    /// complete payloads either way.
    pub fn deliver_partial_objects(&self) -> bool {
        self.deliver_partial_objects
    }

    /// Upper bound on concurrently outstanding subscribe/fetch requests.
    pub fn max_request_id(&self) -> u64 {
        self.max_request_id
    }
}

impl Default for SessionParameters {
    fn default() -> Self {
        SessionParameters::new(1, false, 128)
    }
}
