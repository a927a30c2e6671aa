use crate::modules::live_relay_queue::{
    buffer::{FetchSlice, TrackBuffer},
    commands::LiveRelayQueueCommand,
};
use crate::modules::transport::CloseReason;
use moqt_core::models::tracks::FullTrackName;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Single task owning every track buffer. Commands from all sessions are
/// serialized through one channel, which is what makes publish-and-fan-out
/// atomic per track.
pub(crate) async fn live_relay_queue(
    rx: &mut mpsc::Receiver<LiveRelayQueueCommand>,
    track_buffer_bound: usize,
) {
    tracing::trace!("live_relay_queue start");

    let mut tracks: HashMap<FullTrackName, TrackBuffer> = HashMap::new();

    while let Some(cmd) = rx.recv().await {
        tracing::trace!("command received: {:#?}", cmd);
        match cmd {
            LiveRelayQueueCommand::Publish {
                track,
                object,
                resp,
            } => {
                let buffer = tracks
                    .entry(track.clone())
                    .or_insert_with(|| TrackBuffer::new(track_buffer_bound));
                let result = buffer.publish(object);
                if let Err(err) = &result {
                    // A misbehaving publisher poisons only its own track.
                    tracing::warn!("dropping track after publish error: {:?}", err);
                    if let Some(mut buffer) = tracks.remove(&track) {
                        buffer.close_all(CloseReason::SubscriptionEnded);
                    }
                }
                let _ = resp.send(result);
            }
            LiveRelayQueueCommand::AddSubscription {
                track,
                subscription,
                queue,
                resp,
            } => {
                let buffer = tracks
                    .entry(track)
                    .or_insert_with(|| TrackBuffer::new(track_buffer_bound));
                let _ = resp.send(buffer.add_subscription(subscription, queue));
            }
            LiveRelayQueueCommand::RemoveSubscription {
                track,
                subscribe_id,
                reason,
                resp,
            } => {
                if let Some(buffer) = tracks.get_mut(&track) {
                    buffer.remove_subscription(subscribe_id, reason);
                }
                let _ = resp.send(Ok(()));
            }
            LiveRelayQueueCommand::FetchRange {
                track,
                start,
                end,
                resp,
            } => {
                let result = match tracks.get(&track) {
                    Some(buffer) => Ok(buffer.fetch_range(start, end)),
                    None => Ok(FetchSlice::new(Vec::new(), None, None)),
                };
                let _ = resp.send(result);
            }
            LiveRelayQueueCommand::RemoveTrack { track, resp } => {
                if let Some(mut buffer) = tracks.remove(&track) {
                    buffer.close_all(CloseReason::SubscriptionEnded);
                }
                let _ = resp.send(Ok(()));
            }
        }
    }

    tracing::trace!("live_relay_queue end");
}
