use async_trait::async_trait;
use moqt_core::{
    errors::RelayError,
    models::{
        object::MoqtObject,
        range::GapNotice,
        tracks::ForwardingPreference,
    },
};

/// Identity of the output stream an entry is delivered on, derived from
/// the subscription's forwarding preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKey {
    /// All objects of the track share one ordered stream.
    Track,
    /// One stream per (group, subgroup) pair, so a stalled group can be
    /// abandoned without blocking the others.
    Subgroup { group_id: u64, subgroup_id: u64 },
    Datagram,
}

impl StreamKey {
    pub fn for_object(preference: ForwardingPreference, object: &MoqtObject) -> StreamKey {
        match preference {
            ForwardingPreference::Track => StreamKey::Track,
            ForwardingPreference::Subgroup => StreamKey::Subgroup {
                group_id: object.group_id(),
                subgroup_id: object.subgroup_id(),
            },
            ForwardingPreference::Datagram => StreamKey::Datagram,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Unsubscribed,
    /// A bounded window's end location was delivered.
    SubscriptionEnded,
    SessionTerminated,
    TransportUnavailable,
}

/// One subscriber's delivery channel. Wire encoding and QUIC stream
/// management live behind this trait; the engine never touches raw bytes.
#[async_trait]
pub trait OutputChannel: Send {
    /// Deliver one object on the stream identified by `stream_key`.
    /// Returns `TransportUnavailable` once the channel is gone.
    async fn send_object(
        &mut self,
        stream_key: StreamKey,
        object: &MoqtObject,
    ) -> Result<(), RelayError>;

    /// Tell the subscriber a range was evicted before delivery.
    async fn send_gap(&mut self, gap: &GapNotice) -> Result<(), RelayError>;

    /// Whether the channel can currently accept more data. The forwarder
    /// suspends while this is false instead of blocking the publisher.
    fn is_ready(&self) -> bool;

    async fn close(&mut self, reason: CloseReason);
}

/// Path used by the probe manager to deliver measurable traffic. The
/// implementation resolves once the transport confirms delivery of `len`
/// bytes.
#[async_trait]
pub trait ProbePath: Send {
    async fn deliver_probe(&mut self, len: usize) -> Result<(), RelayError>;
}

#[cfg(test)]
mod success {
    use crate::modules::transport::StreamKey;
    use bytes::Bytes;
    use moqt_core::models::{
        location::Location,
        object::{MoqtObject, ObjectStatus},
        tracks::ForwardingPreference,
    };

    #[test]
    fn stream_key_for_object() {
        let object = MoqtObject::new(
            0,
            Location::new(4, 2),
            7,
            128,
            ObjectStatus::Normal,
            Bytes::new(),
        );

        assert_eq!(
            StreamKey::for_object(ForwardingPreference::Track, &object),
            StreamKey::Track
        );
        assert_eq!(
            StreamKey::for_object(ForwardingPreference::Subgroup, &object),
            StreamKey::Subgroup {
                group_id: 4,
                subgroup_id: 7
            }
        );
        assert_eq!(
            StreamKey::for_object(ForwardingPreference::Datagram, &object),
            StreamKey::Datagram
        );
    }
}
