use crate::modules::transport::{CloseReason, OutputChannel, StreamKey};
use anyhow::Result;
use moqt_core::models::{location::Location, object::MoqtObject, range::GapNotice};
use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::Notify;

/// How often the forwarder re-checks a congested output channel.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq)]
pub enum QueueEntry {
    Object {
        stream_key: StreamKey,
        object: MoqtObject,
    },
    Gap(GapNotice),
}

#[derive(Debug)]
struct QueueState {
    /// Evicted-range notices; delivered ahead of everything else and
    /// exempt from the capacity bound.
    gaps: VecDeque<GapNotice>,
    /// Replay of buffered objects for a new subscription, pre-ordered per
    /// its delivery order. Fully drained before any live entry.
    backlog: VecDeque<(StreamKey, MoqtObject)>,
    /// Live entries, drained by (publisher priority, location).
    live: BTreeMap<(u8, Location), (StreamKey, MoqtObject)>,
    /// Largest location ever enqueued. Gaps at or below it are stale:
    /// those objects reached this queue before being evicted upstream.
    high_water: Option<Location>,
    capacity: usize,
    closed: Option<CloseReason>,
}

impl QueueState {
    fn object_count(&self) -> usize {
        self.backlog.len() + self.live.len()
    }

    fn pop(&mut self) -> Option<QueueEntry> {
        if let Some(gap) = self.gaps.pop_front() {
            return Some(QueueEntry::Gap(gap));
        }

        if let Some((stream_key, object)) = self.backlog.pop_front() {
            return Some(QueueEntry::Object { stream_key, object });
        }

        let first_key = *self.live.keys().next()?;
        let (stream_key, object) = self.live.remove(&first_key).unwrap();
        Some(QueueEntry::Object { stream_key, object })
    }

    fn raise_high_water(&mut self, location: Location) {
        if self.high_water.map_or(true, |high| location > high) {
            self.high_water = Some(location);
        }
    }

    /// Drops the single worst buffered object: numerically largest
    /// publisher priority first, oldest location on ties.
    fn evict_worst(&mut self) {
        let worst_live = self.live.keys().next_back().map(|(priority, _)| *priority);
        let worst_live_key = worst_live.map(|priority| {
            *self
                .live
                .range((priority, Location::new(0, 0))..)
                .next()
                .unwrap()
                .0
        });

        let worst_backlog_index = self
            .backlog
            .iter()
            .enumerate()
            .max_by(|(_, (_, a)), (_, (_, b))| {
                (a.publisher_priority(), std::cmp::Reverse(a.location()))
                    .cmp(&(b.publisher_priority(), std::cmp::Reverse(b.location())))
            })
            .map(|(index, _)| index);

        match (worst_live_key, worst_backlog_index) {
            (Some(live_key), Some(backlog_index)) => {
                let (_, backlog_object) = &self.backlog[backlog_index];
                let backlog_worse =
                    match backlog_object.publisher_priority().cmp(&live_key.0) {
                        std::cmp::Ordering::Greater => true,
                        std::cmp::Ordering::Less => false,
                        // Same priority: drop the older location
                        std::cmp::Ordering::Equal => backlog_object.location() < live_key.1,
                    };
                if backlog_worse {
                    self.backlog.remove(backlog_index);
                } else {
                    self.live.remove(&live_key);
                }
            }
            (Some(live_key), None) => {
                self.live.remove(&live_key);
            }
            (None, Some(backlog_index)) => {
                self.backlog.remove(backlog_index);
            }
            (None, None) => {}
        }
    }

    fn trim_to_capacity(&mut self) {
        while self.object_count() > self.capacity {
            self.evict_worst();
        }
    }
}

/// Per-subscription delivery buffer feeding one output channel.
///
/// Enqueueing never blocks: at capacity the drop policy runs instead, so a
/// slow subscriber can never stall the publisher path.
#[derive(Debug)]
pub struct OutgoingQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

pub type OutgoingQueueHandle = Arc<OutgoingQueue>;

impl OutgoingQueue {
    pub fn new(capacity: usize) -> OutgoingQueueHandle {
        Arc::new(OutgoingQueue {
            state: Mutex::new(QueueState {
                gaps: VecDeque::new(),
                backlog: VecDeque::new(),
                live: BTreeMap::new(),
                high_water: None,
                capacity,
                closed: None,
            }),
            notify: Notify::new(),
        })
    }

    pub fn enqueue_object(&self, stream_key: StreamKey, object: MoqtObject) {
        let mut state = self.state.lock().unwrap();
        if state.closed.is_some() {
            return;
        }

        let key = (object.publisher_priority(), object.location());
        state.raise_high_water(object.location());
        state.live.insert(key, (stream_key, object));
        state.trim_to_capacity();
        drop(state);

        self.notify.notify_one();
    }

    /// Installs the catch-up replay for a new subscription. Entries are
    /// delivered in the given order, ahead of any live entry.
    pub fn enqueue_backlog(&self, entries: Vec<(StreamKey, MoqtObject)>) {
        let mut state = self.state.lock().unwrap();
        if state.closed.is_some() {
            return;
        }

        for (_, object) in &entries {
            state.raise_high_water(object.location());
        }
        state.backlog.extend(entries);
        state.trim_to_capacity();
        drop(state);

        self.notify.notify_one();
    }

    /// Suppressed when the queue already received the evicted range: those
    /// objects made it here before upstream eviction, so there is no gap.
    pub fn enqueue_gap(&self, gap: GapNotice) {
        let mut state = self.state.lock().unwrap();
        if state.closed.is_some() {
            return;
        }
        if let Some(high) = state.high_water {
            if high >= gap.to() {
                return;
            }
        }

        state.gaps.push_back(gap);
        drop(state);

        self.notify.notify_one();
    }

    pub fn pop(&self) -> Option<QueueEntry> {
        self.state.lock().unwrap().pop()
    }

    /// Next entry in delivery order; waits for one to arrive. Returns
    /// `None` once the queue is closed and drained.
    pub async fn next(&self) -> Option<QueueEntry> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().unwrap();
                if let Some(entry) = state.pop() {
                    return Some(entry);
                }
                if state.closed.is_some() {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Graceful reasons drain remaining entries first; a transport failure
    /// discards them since nothing can be delivered anymore.
    pub fn close(&self, reason: CloseReason) {
        let mut state = self.state.lock().unwrap();
        if state.closed.is_some() {
            return;
        }
        state.closed = Some(reason);
        if reason == CloseReason::TransportUnavailable {
            state.gaps.clear();
            state.backlog.clear();
            state.live.clear();
        }
        drop(state);

        self.notify.notify_one();
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.state.lock().unwrap().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().object_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drains one subscription's queue into its output channel, suspending on
/// backpressure. A transport failure ends only this forwarder; the
/// publisher and the other subscriptions are unaffected.
pub async fn object_forwarder(
    queue: OutgoingQueueHandle,
    mut channel: Box<dyn OutputChannel>,
) -> Result<()> {
    loop {
        while !channel.is_ready() {
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        let entry = match queue.next().await {
            Some(entry) => entry,
            None => break,
        };

        let result = match &entry {
            QueueEntry::Object { stream_key, object } => {
                channel.send_object(*stream_key, object).await
            }
            QueueEntry::Gap(gap) => channel.send_gap(gap).await,
        };

        if let Err(err) = result {
            tracing::warn!("output channel failed, closing subscription: {:?}", err);
            queue.close(CloseReason::TransportUnavailable);
            channel.close(CloseReason::TransportUnavailable).await;
            return Ok(());
        }
    }

    let reason = queue.close_reason().unwrap_or(CloseReason::Unsubscribed);
    channel.close(reason).await;

    tracing::debug!("object forwarder finished: {:?}", reason);
    Ok(())
}
