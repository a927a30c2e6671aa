use crate::modules::{
    live_relay_queue::buffer::FetchSlice, outgoing_queue::OutgoingQueueHandle,
    transport::CloseReason,
};
use moqt_core::{
    errors::RelayError,
    models::{
        location::Location,
        object::MoqtObject,
        subscriptions::{SubscribeId, Subscription},
        tracks::FullTrackName,
    },
};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum LiveRelayQueueCommand {
    Publish {
        track: FullTrackName,
        object: MoqtObject,
        resp: oneshot::Sender<Result<(), RelayError>>,
    },
    AddSubscription {
        track: FullTrackName,
        subscription: Subscription,
        queue: OutgoingQueueHandle,
        resp: oneshot::Sender<Result<(), RelayError>>,
    },
    RemoveSubscription {
        track: FullTrackName,
        subscribe_id: SubscribeId,
        reason: CloseReason,
        resp: oneshot::Sender<Result<(), RelayError>>,
    },
    FetchRange {
        track: FullTrackName,
        start: Location,
        end: Location,
        resp: oneshot::Sender<Result<FetchSlice, RelayError>>,
    },
    RemoveTrack {
        track: FullTrackName,
        resp: oneshot::Sender<Result<(), RelayError>>,
    },
}
