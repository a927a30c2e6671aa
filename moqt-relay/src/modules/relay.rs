use crate::modules::{
    bitrate::BitrateAdjuster,
    config::RelayConfig,
    fetch::{FetchEngine, ObjectStore},
    live_relay_queue::wrapper::LiveRelayQueueWrapper,
    outgoing_queue::{object_forwarder, OutgoingQueue},
    probe::ProbeManager,
    session::SessionRegistry,
    transport::{CloseReason, OutputChannel, ProbePath},
};
use moqt_core::{
    errors::RelayError,
    models::{
        location::Location,
        object::MoqtObject,
        range::SubscribeWindow,
        session_parameters::SessionParameters,
        subscriptions::{SessionId, SubscribeId, Subscription},
        tracks::{DeliveryOrder, ForwardingPreference, FullTrackName, TrackAlias, TrackNamespace},
    },
    namespace_index::NamespaceIndex,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

const ESTIMATE_CHANNEL_BOUND: usize = 16;

/// One relay's forwarding engine: the namespace index, the session
/// registry and the relay queue task, tied together behind a facade the
/// transport layer drives.
pub struct RelayInstance {
    config: RelayConfig,
    namespace_index: Mutex<NamespaceIndex>,
    sessions: Mutex<SessionRegistry>,
    relay_queue: LiveRelayQueueWrapper,
    fetch_engine: FetchEngine,
    queue_task: JoinHandle<()>,
}

impl RelayInstance {
    pub fn new(config: RelayConfig) -> Self {
        Self::build(config, None)
    }

    pub fn with_store(config: RelayConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self::build(config, Some(store))
    }

    fn build(config: RelayConfig, store: Option<Arc<dyn ObjectStore>>) -> Self {
        let (relay_queue, queue_task) = LiveRelayQueueWrapper::spawn(config.track_buffer_bound);
        let fetch_engine = FetchEngine::new(relay_queue.clone(), store);

        Self {
            config,
            namespace_index: Mutex::new(NamespaceIndex::new()),
            sessions: Mutex::new(SessionRegistry::new()),
            relay_queue,
            fetch_engine,
            queue_task,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Handle for track sources to publish through.
    pub fn relay_queue(&self) -> LiveRelayQueueWrapper {
        self.relay_queue.clone()
    }

    pub async fn add_session(&self, parameters: SessionParameters) -> SessionId {
        let session_id = self.sessions.lock().await.add(parameters);
        tracing::debug!("session added: {}", session_id);
        session_id
    }

    /// Tears a session down: its subscriptions are closed and whatever it
    /// had registered stays registered until explicitly unannounced.
    pub async fn remove_session(&self, session_id: SessionId) {
        let context = self.sessions.lock().await.remove(session_id);
        let Some(context) = context else {
            return;
        };

        for (track, subscribe_id) in context.subscriptions() {
            let _ = self
                .relay_queue
                .remove_subscription(track.clone(), *subscribe_id, CloseReason::SessionTerminated)
                .await;
        }
        tracing::debug!("session removed: {}", session_id);
    }

    pub async fn register_namespace(
        &self,
        namespace: &TrackNamespace,
        session_id: SessionId,
    ) -> Result<(), RelayError> {
        self.namespace_index
            .lock()
            .await
            .insert(namespace, session_id)
    }

    pub async fn unregister_namespace(&self, namespace: &TrackNamespace) -> Option<SessionId> {
        self.namespace_index.lock().await.remove(namespace)
    }

    /// Deepest registered prefix wins.
    pub async fn resolve_publisher(&self, namespace: &TrackNamespace) -> Option<SessionId> {
        self.namespace_index.lock().await.resolve(namespace)
    }

    /// Admits a subscription and starts forwarding into `channel`. Returns
    /// the session's alias for the track.
    #[allow(clippy::too_many_arguments)]
    pub async fn subscribe(
        &self,
        session_id: SessionId,
        track: FullTrackName,
        subscribe_id: SubscribeId,
        window: SubscribeWindow,
        subscriber_priority: u8,
        forwarding_preference: ForwardingPreference,
        delivery_order: DeliveryOrder,
        channel: Box<dyn OutputChannel>,
    ) -> Result<TrackAlias, RelayError> {
        let track_alias = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .get_mut(session_id)
                .ok_or_else(|| RelayError::ProtocolViolation("unknown session".to_string()))?;
            session.begin_request()?;
            session.alias_for(&track)
        };

        let subscription = Subscription::new(
            subscribe_id,
            track_alias,
            window,
            subscriber_priority,
            forwarding_preference,
            delivery_order,
            session_id,
        );
        let queue = OutgoingQueue::new(self.config.outgoing_queue_capacity);
        let result = self
            .relay_queue
            .add_subscription(track.clone(), subscription, queue.clone())
            .await;

        {
            let mut sessions = self.sessions.lock().await;
            if let Some(session) = sessions.get_mut(session_id) {
                session.end_request();
                if result.is_ok() {
                    session.record_subscription(track, subscribe_id);
                }
            }
        }
        result?;

        tokio::spawn(object_forwarder(queue, channel));
        Ok(track_alias)
    }

    /// Idempotent, like the underlying removal.
    pub async fn unsubscribe(
        &self,
        session_id: SessionId,
        track: FullTrackName,
        subscribe_id: SubscribeId,
    ) -> Result<(), RelayError> {
        self.relay_queue
            .remove_subscription(track.clone(), subscribe_id, CloseReason::Unsubscribed)
            .await?;

        if let Some(session) = self.sessions.lock().await.get_mut(session_id) {
            session.forget_subscription(&track, subscribe_id);
        }

        Ok(())
    }

    pub async fn fetch(
        &self,
        session_id: SessionId,
        track: FullTrackName,
        start: Location,
        end: Location,
        delivery_order: DeliveryOrder,
    ) -> Result<Vec<MoqtObject>, RelayError> {
        {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .get_mut(session_id)
                .ok_or_else(|| RelayError::ProtocolViolation("unknown session".to_string()))?;
            session.begin_request()?;
        }

        let result = self.fetch_engine.fetch(track, start, end, delivery_order).await;

        if let Some(session) = self.sessions.lock().await.get_mut(session_id) {
            session.end_request();
        }

        result
    }

    /// Starts probing one path; the returned watch carries the current
    /// target bitrate for it.
    pub fn start_probe<P: ProbePath + 'static>(&self, path: P) -> watch::Receiver<u64> {
        let (estimate_tx, estimate_rx) = mpsc::channel(ESTIMATE_CHANNEL_BOUND);
        let adjuster = BitrateAdjuster::new(&self.config);
        let (target_tx, target_rx) = watch::channel(adjuster.target_bitrate());

        let manager = ProbeManager::new(
            path,
            self.config.probe_size,
            self.config.probe_interval,
            self.config.probe_timeout,
            estimate_tx,
        );
        tokio::spawn(manager.run());
        tokio::spawn(adjuster.run(estimate_rx, target_tx));

        target_rx
    }

    pub fn shutdown(&self) {
        self.queue_task.abort();
    }
}

#[cfg(test)]
pub(crate) mod test_helper_fn {
    use crate::modules::transport::{CloseReason, OutputChannel, StreamKey};
    use async_trait::async_trait;
    use moqt_core::{
        errors::RelayError,
        models::{object::MoqtObject, range::GapNotice},
    };
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    pub(crate) struct ChannelLog {
        pub(crate) objects: Vec<(u64, u64)>,
        pub(crate) gaps: usize,
        pub(crate) closed: Option<CloseReason>,
    }

    pub(crate) struct RecordingChannel {
        log: Arc<Mutex<ChannelLog>>,
    }

    impl RecordingChannel {
        pub(crate) fn new() -> (Box<dyn OutputChannel>, Arc<Mutex<ChannelLog>>) {
            let log = Arc::new(Mutex::new(ChannelLog::default()));
            (Box::new(RecordingChannel { log: log.clone() }), log)
        }
    }

    #[async_trait]
    impl OutputChannel for RecordingChannel {
        async fn send_object(
            &mut self,
            _stream_key: StreamKey,
            object: &MoqtObject,
        ) -> Result<(), RelayError> {
            self.log
                .lock()
                .unwrap()
                .objects
                .push((object.group_id(), object.object_id()));
            Ok(())
        }

        async fn send_gap(&mut self, _gap: &GapNotice) -> Result<(), RelayError> {
            self.log.lock().unwrap().gaps += 1;
            Ok(())
        }

        fn is_ready(&self) -> bool {
            true
        }

        async fn close(&mut self, reason: CloseReason) {
            self.log.lock().unwrap().closed = Some(reason);
        }
    }

    pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }
}
