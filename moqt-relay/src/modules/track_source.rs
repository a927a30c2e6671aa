use crate::modules::live_relay_queue::wrapper::LiveRelayQueueWrapper;
use anyhow::Result;
use async_trait::async_trait;
use moqt_core::models::{location::Location, object::MoqtObject, tracks::FullTrackName};
use tokio::sync::mpsc;

const SOURCE_CHANNEL_BOUND: usize = 256;

/// Where a track's objects come from before they enter the relay queue.
#[async_trait]
pub trait TrackSource: Send {
    fn track(&self) -> &FullTrackName;

    /// Next object, or `None` once the source is exhausted.
    async fn produce(&mut self) -> Option<MoqtObject>;
}

/// Track fed by a publisher connected to this relay.
pub struct LocalTrackSource {
    track: FullTrackName,
    rx: mpsc::Receiver<MoqtObject>,
}

impl LocalTrackSource {
    pub fn new(track: FullTrackName) -> (Self, mpsc::Sender<MoqtObject>) {
        let (tx, rx) = mpsc::channel(SOURCE_CHANNEL_BOUND);
        (Self { track, rx }, tx)
    }
}

#[async_trait]
impl TrackSource for LocalTrackSource {
    fn track(&self) -> &FullTrackName {
        &self.track
    }

    async fn produce(&mut self) -> Option<MoqtObject> {
        self.rx.recv().await
    }
}

/// Track mirrored from a subscription on an upstream relay. Upstream
/// replays can re-deliver already seen locations, so non-advancing
/// objects are filtered out here.
pub struct UpstreamRelaySource {
    track: FullTrackName,
    rx: mpsc::Receiver<MoqtObject>,
    last_location: Option<Location>,
}

impl UpstreamRelaySource {
    pub fn new(track: FullTrackName) -> (Self, mpsc::Sender<MoqtObject>) {
        let (tx, rx) = mpsc::channel(SOURCE_CHANNEL_BOUND);
        (
            Self {
                track,
                rx,
                last_location: None,
            },
            tx,
        )
    }
}

#[async_trait]
impl TrackSource for UpstreamRelaySource {
    fn track(&self) -> &FullTrackName {
        &self.track
    }

    async fn produce(&mut self) -> Option<MoqtObject> {
        while let Some(object) = self.rx.recv().await {
            let location = object.location();
            if self.last_location.map_or(false, |last| location <= last) {
                tracing::trace!("duplicate upstream object at {:?}, skipped", location);
                continue;
            }
            self.last_location = Some(location);
            return Some(object);
        }

        None
    }
}

/// Feeds a source into the relay queue until it is exhausted, then drops
/// the track.
pub async fn run_track_source(
    mut source: impl TrackSource,
    relay_queue: LiveRelayQueueWrapper,
) -> Result<()> {
    let track = source.track().clone();
    tracing::debug!("track source start: {:?}", track);

    while let Some(object) = source.produce().await {
        relay_queue.publish(track.clone(), object).await?;
    }

    relay_queue.remove_track(track.clone()).await?;
    tracing::debug!("track source end: {:?}", track);

    Ok(())
}
