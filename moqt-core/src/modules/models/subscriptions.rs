use crate::models::{
    location::Location,
    range::SubscribeWindow,
    tracks::{DeliveryOrder, ForwardingPreference, TrackAlias},
};

pub type SubscribeId = u64;
pub type SessionId = usize;

/// A standing request for a range of a track's objects.
///
/// Subscriptions reference their owning session by id rather than holding
/// it, so no ownership cycle exists between session, subscription and
/// outgoing queue; lookups go through the owning registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    subscribe_id: SubscribeId,
    track_alias: TrackAlias,
    window: SubscribeWindow,
    subscriber_priority: u8,
    forwarding_preference: ForwardingPreference,
    delivery_order: DeliveryOrder,
    session_id: SessionId,
}

impl Subscription {
    pub fn new(
        subscribe_id: SubscribeId,
        track_alias: TrackAlias,
        window: SubscribeWindow,
        subscriber_priority: u8,
        forwarding_preference: ForwardingPreference,
        delivery_order: DeliveryOrder,
        session_id: SessionId,
    ) -> Self {
        Self {
            subscribe_id,
            track_alias,
            window,
            subscriber_priority,
            forwarding_preference,
            delivery_order,
            session_id,
        }
    }

    pub fn subscribe_id(&self) -> SubscribeId {
        self.subscribe_id
    }

    pub fn track_alias(&self) -> TrackAlias {
        self.track_alias
    }

    pub fn window(&self) -> &SubscribeWindow {
        &self.window
    }

    pub fn subscriber_priority(&self) -> u8 {
        self.subscriber_priority
    }

    pub fn forwarding_preference(&self) -> ForwardingPreference {
        self.forwarding_preference
    }

    pub fn delivery_order(&self) -> DeliveryOrder {
        self.delivery_order
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn is_interested(&self, location: Location) -> bool {
        self.window.contains(location)
    }

    /// Whether delivering `location` exhausts a bounded window.
    pub fn is_window_end(&self, location: Location) -> bool {
        self.window.end() == Some(location)
    }
}
