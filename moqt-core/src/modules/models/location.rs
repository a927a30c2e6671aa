use serde::Serialize;

/// Position of an object within a track.
///
/// Ordered by group first, then by object within the group. This is the
/// total order every delivery guarantee in the relay is defined against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    group_id: u64,
    object_id: u64,
}

impl Location {
    pub fn new(group_id: u64, object_id: u64) -> Self {
        Self {
            group_id,
            object_id,
        }
    }

    pub fn group_id(&self) -> u64 {
        self.group_id
    }

    pub fn object_id(&self) -> u64 {
        self.object_id
    }

    /// The next object position within the same group.
    pub fn next(&self) -> Location {
        Location::new(self.group_id, self.object_id + 1)
    }
}
