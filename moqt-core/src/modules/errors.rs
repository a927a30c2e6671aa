use crate::models::location::Location;
use thiserror::Error;

/// Failure taxonomy of the relay engine.
///
/// None of these is fatal to the relay: protocol violations terminate the
/// offending subscription or request, capacity problems are absorbed by
/// eviction, transport failures isolate the affected subscriber.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("namespace is already registered")]
    DuplicateRegistration,

    #[error("subscribe id {0} is already in use")]
    DuplicateSubscription(u64),

    #[error("capacity exceeded")]
    CapacityExceeded,

    /// Part of the requested range has been evicted and no backing store
    /// covers it. `available_from` is the oldest still-retained location,
    /// letting the requester re-issue a narrower fetch.
    #[error("requested range is no longer available")]
    RangeUnavailable { available_from: Option<Location> },

    #[error("output channel is unavailable")]
    TransportUnavailable,
}
