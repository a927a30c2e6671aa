use crate::modules::{
    live_relay_queue::{buffer::FetchSlice, commands::LiveRelayQueueCommand, queue},
    outgoing_queue::OutgoingQueueHandle,
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
use tokio::sync::{mpsc, oneshot};

const COMMAND_CHANNEL_BOUND: usize = 1024;

/// Cloneable handle to the relay queue task. Each method is one command
/// round trip; panics only if the task itself is gone.
#[derive(Debug, Clone)]
pub struct LiveRelayQueueWrapper {
    tx: mpsc::Sender<LiveRelayQueueCommand>,
}

impl LiveRelayQueueWrapper {
    pub(crate) fn new(tx: mpsc::Sender<LiveRelayQueueCommand>) -> Self {
        Self { tx }
    }

    /// Spawns the relay queue task and returns a handle to it together
    /// with the task's join handle.
    pub fn spawn(track_buffer_bound: usize) -> (Self, tokio::task::JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(COMMAND_CHANNEL_BOUND);
        let join_handle = tokio::spawn(async move {
            queue::live_relay_queue(&mut rx, track_buffer_bound).await;
        });

        (Self::new(tx), join_handle)
    }

    pub async fn publish(
        &self,
        track: FullTrackName,
        object: MoqtObject,
    ) -> Result<(), RelayError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(LiveRelayQueueCommand::Publish {
                track,
                object,
                resp: resp_tx,
            })
            .await
            .unwrap();

        resp_rx.await.unwrap()
    }

    pub async fn add_subscription(
        &self,
        track: FullTrackName,
        subscription: Subscription,
        queue: OutgoingQueueHandle,
    ) -> Result<(), RelayError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(LiveRelayQueueCommand::AddSubscription {
                track,
                subscription,
                queue,
                resp: resp_tx,
            })
            .await
            .unwrap();

        resp_rx.await.unwrap()
    }

    pub async fn remove_subscription(
        &self,
        track: FullTrackName,
        subscribe_id: SubscribeId,
        reason: CloseReason,
    ) -> Result<(), RelayError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(LiveRelayQueueCommand::RemoveSubscription {
                track,
                subscribe_id,
                reason,
                resp: resp_tx,
            })
            .await
            .unwrap();

        resp_rx.await.unwrap()
    }

    pub async fn fetch_range(
        &self,
        track: FullTrackName,
        start: Location,
        end: Location,
    ) -> Result<FetchSlice, RelayError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(LiveRelayQueueCommand::FetchRange {
                track,
                start,
                end,
                resp: resp_tx,
            })
            .await
            .unwrap();

        resp_rx.await.unwrap()
    }

    pub async fn remove_track(&self, track: FullTrackName) -> Result<(), RelayError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(LiveRelayQueueCommand::RemoveTrack {
                track,
                resp: resp_tx,
            })
            .await
            .unwrap();

        resp_rx.await.unwrap()
    }
}
