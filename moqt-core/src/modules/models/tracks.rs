use serde::Serialize;

pub type TrackAlias = u64;

/// Hierarchical track namespace: an ordered tuple of opaque components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TrackNamespace {
    components: Vec<String>,
}

impl TrackNamespace {
    pub fn new(components: Vec<String>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Whether `prefix`'s components are a leading subsequence of this
    /// namespace's components.
    pub fn has_prefix(&self, prefix: &TrackNamespace) -> bool {
        if self.components.len() < prefix.components.len() {
            return false;
        }

        prefix
            .components
            .iter()
            .zip(self.components.iter())
            .all(|(prefix_component, component)| prefix_component == component)
    }
}

impl From<Vec<&str>> for TrackNamespace {
    fn from(components: Vec<&str>) -> Self {
        TrackNamespace::new(components.into_iter().map(String::from).collect())
    }
}

/// Identity key for a track: namespace plus track name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FullTrackName {
    track_namespace: TrackNamespace,
    track_name: String,
}

impl FullTrackName {
    pub fn new(track_namespace: TrackNamespace, track_name: String) -> Self {
        Self {
            track_namespace,
            track_name,
        }
    }

    pub fn track_namespace(&self) -> &TrackNamespace {
        &self.track_namespace
    }

    pub fn track_name(&self) -> &str {
        &self.track_name
    }
}

/// How a track's objects are mapped onto output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForwardingPreference {
    /// All objects of the track share one ordered stream.
    Track,
    /// One stream per (group, subgroup) pair.
    Subgroup,
    /// Unreliable datagram delivery.
    Datagram,
}

/// Order in which buffered objects are offered to a newly added
/// subscription. Live delivery is always by ascending location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliveryOrder {
    Ascending,
    Descending,
}

#[cfg(test)]
mod success {
    use crate::models::tracks::{FullTrackName, TrackNamespace};

    #[test]
    fn new() {
        let track_namespace = TrackNamespace::from(vec!["live", "video"]);

        assert_eq!(track_namespace.components(), ["live", "video"]);
        assert_eq!(track_namespace.len(), 2);
    }

    #[test]
    fn has_prefix() {
        let track_namespace = TrackNamespace::from(vec!["live", "video", "camera1"]);
        let prefix = TrackNamespace::from(vec!["live", "video"]);

        assert!(track_namespace.has_prefix(&prefix));
        assert!(track_namespace.has_prefix(&track_namespace.clone()));
    }

    #[test]
    fn has_prefix_mismatch() {
        let track_namespace = TrackNamespace::from(vec!["live", "video"]);
        let longer = TrackNamespace::from(vec!["live", "video", "camera1"]);
        let diverging = TrackNamespace::from(vec!["live", "audio"]);

        assert!(!track_namespace.has_prefix(&longer));
        assert!(!track_namespace.has_prefix(&diverging));
    }

    #[test]
    fn full_track_name() {
        let track_namespace = TrackNamespace::from(vec!["live", "video"]);
        let full_track_name = FullTrackName::new(track_namespace.clone(), "hd".to_string());

        assert_eq!(full_track_name.track_namespace(), &track_namespace);
        assert_eq!(full_track_name.track_name(), "hd");
    }
}
