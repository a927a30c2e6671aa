use crate::models::{location::Location, tracks::TrackAlias};
use bytes::Bytes;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

/// Status carried alongside an object's (possibly empty) payload.
///
/// End markers let late joiners and fetches distinguish "missing" from
/// "complete".
#[derive(Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, Clone, Copy, Serialize)]
#[repr(u64)]
pub enum ObjectStatus {
    Normal = 0x0,
    DoesNotExist = 0x1,
    EndOfGroup = 0x3,
    EndOfTrack = 0x4,
}

/// A single published media object. Immutable after creation; the payload
/// is an opaque byte sequence to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoqtObject {
    track_alias: TrackAlias,
    location: Location,
    subgroup_id: u64,
    publisher_priority: u8,
    object_status: ObjectStatus,
    payload: Bytes,
}

impl MoqtObject {
    pub fn new(
        track_alias: TrackAlias,
        location: Location,
        subgroup_id: u64,
        publisher_priority: u8,
        object_status: ObjectStatus,
        payload: Bytes,
    ) -> Self {
        Self {
            track_alias,
            location,
            subgroup_id,
            publisher_priority,
            object_status,
            payload,
        }
    }

    pub fn track_alias(&self) -> TrackAlias {
        self.track_alias
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn group_id(&self) -> u64 {
        self.location.group_id()
    }

    pub fn object_id(&self) -> u64 {
        self.location.object_id()
    }

    pub fn subgroup_id(&self) -> u64 {
        self.subgroup_id
    }

    pub fn publisher_priority(&self) -> u8 {
        self.publisher_priority
    }

    pub fn object_status(&self) -> ObjectStatus {
        self.object_status
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn payload_length(&self) -> usize {
        self.payload.len()
    }

    pub fn is_end_of_group(&self) -> bool {
        matches!(
            self.object_status,
            ObjectStatus::EndOfGroup | ObjectStatus::EndOfTrack
        )
    }

    pub fn is_end_of_track(&self) -> bool {
        self.object_status == ObjectStatus::EndOfTrack
    }
}
