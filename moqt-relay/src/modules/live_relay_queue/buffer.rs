use crate::modules::{
    outgoing_queue::OutgoingQueueHandle,
    transport::{CloseReason, StreamKey},
};
use moqt_core::{
    errors::RelayError,
    models::{
        location::Location,
        object::MoqtObject,
        range::GapNotice,
        subscriptions::{SubscribeId, Subscription},
        tracks::DeliveryOrder,
    },
    subscribe_windows::SubscribeWindowSet,
};
use std::collections::{BTreeMap, HashMap};

/// The buffered portion of a fetch range, together with what is known
/// about the part that is no longer buffered.
#[derive(Debug, Clone)]
pub struct FetchSlice {
    objects: Vec<MoqtObject>,
    missing_prefix: Option<(Location, Location)>,
    available_from: Option<Location>,
}

impl FetchSlice {
    pub fn new(
        objects: Vec<MoqtObject>,
        missing_prefix: Option<(Location, Location)>,
        available_from: Option<Location>,
    ) -> Self {
        Self {
            objects,
            missing_prefix,
            available_from,
        }
    }

    pub fn objects(&self) -> &[MoqtObject] {
        &self.objects
    }

    pub fn into_objects(self) -> Vec<MoqtObject> {
        self.objects
    }

    /// The evicted sub-range at the front of the requested range, if any.
    pub fn missing_prefix(&self) -> Option<(Location, Location)> {
        self.missing_prefix
    }

    /// Earliest location still buffered for the track.
    pub fn available_from(&self) -> Option<Location> {
        self.available_from
    }
}

/// One track's recent objects plus the subscriptions being fed from them.
///
/// Everything here is owned by the relay queue task, so mutations are
/// naturally serialized: an object is buffered and fanned out to every
/// interested outgoing queue as one step, and no subscriber can observe a
/// half-applied publish.
#[derive(Debug)]
pub struct TrackBuffer {
    objects: BTreeMap<Location, MoqtObject>,
    bound: usize,
    /// Largest location ever evicted. Publishes at or below it are late
    /// and dropped.
    evicted_up_to: Option<Location>,
    end_of_track: Option<Location>,
    windows: SubscribeWindowSet,
    queues: HashMap<SubscribeId, OutgoingQueueHandle>,
}

impl TrackBuffer {
    pub fn new(bound: usize) -> Self {
        Self {
            objects: BTreeMap::new(),
            bound,
            evicted_up_to: None,
            end_of_track: None,
            windows: SubscribeWindowSet::new(),
            queues: HashMap::new(),
        }
    }

    /// Buffers one object and delivers it to every interested subscription.
    pub fn publish(&mut self, object: MoqtObject) -> Result<(), RelayError> {
        let location = object.location();

        if let Some(end) = self.end_of_track {
            if location > end {
                return Err(RelayError::ProtocolViolation(format!(
                    "object at {:?} published after end of track at {:?}",
                    location, end
                )));
            }
        }
        if let Some(evicted) = self.evicted_up_to {
            if location <= evicted {
                tracing::trace!("late publish at evicted location {:?}, dropped", location);
                return Ok(());
            }
        }

        if object.is_end_of_track() {
            self.end_of_track = Some(location);
        }
        self.objects.insert(location, object.clone());
        self.enforce_bound();

        for subscription in self.windows.interested(location) {
            if let Some(queue) = self.queues.get(&subscription.subscribe_id()) {
                let stream_key =
                    StreamKey::for_object(subscription.forwarding_preference(), &object);
                queue.enqueue_object(stream_key, object.clone());
            }
        }

        self.close_finished_windows(location);

        if object.is_end_of_track() {
            for (_, queue) in self.queues.drain() {
                queue.close(CloseReason::SubscriptionEnded);
            }
            let remaining: Vec<SubscribeId> =
                self.windows.iter().map(|s| s.subscribe_id()).collect();
            for subscribe_id in remaining {
                self.windows.remove(subscribe_id);
            }
        }

        Ok(())
    }

    /// Registers a subscription, replaying the buffered part of its window
    /// before any live object reaches its queue.
    pub fn add_subscription(
        &mut self,
        subscription: Subscription,
        queue: OutgoingQueueHandle,
    ) -> Result<(), RelayError> {
        let subscribe_id = subscription.subscribe_id();
        if self.queues.contains_key(&subscribe_id) {
            return Err(RelayError::DuplicateSubscription(subscribe_id));
        }

        let window = *subscription.window();
        let mut replay: Vec<(StreamKey, MoqtObject)> = self
            .objects
            .range(window.start()..)
            .filter(|(location, _)| window.contains(**location))
            .map(|(_, object)| {
                (
                    StreamKey::for_object(subscription.forwarding_preference(), object),
                    object.clone(),
                )
            })
            .collect();
        if subscription.delivery_order() == DeliveryOrder::Descending {
            replay.reverse();
        }

        if let Some(evicted) = self.evicted_up_to {
            if window.start() <= evicted {
                queue.enqueue_gap(GapNotice::new(window.start(), evicted));
            }
        }

        // A window the track has already passed gets its replay and ends
        // immediately; it is never registered for live delivery.
        let newest = self.objects.keys().next_back().copied();
        let already_over = self.end_of_track.is_some()
            || window.end().map_or(false, |end| {
                newest.map_or(false, |newest| newest >= end)
                    || self.evicted_up_to.map_or(false, |evicted| evicted >= end)
            });
        if already_over {
            queue.enqueue_backlog(replay);
            queue.close(CloseReason::SubscriptionEnded);
            return Ok(());
        }

        self.windows.add(subscription)?;
        queue.enqueue_backlog(replay);
        self.queues.insert(subscribe_id, queue);

        Ok(())
    }

    /// Idempotent: removing an unknown id is a no-op.
    pub fn remove_subscription(&mut self, subscribe_id: SubscribeId, reason: CloseReason) {
        self.windows.remove(subscribe_id);
        if let Some(queue) = self.queues.remove(&subscribe_id) {
            queue.close(reason);
        }
    }

    pub fn fetch_range(&self, start: Location, end: Location) -> FetchSlice {
        let objects: Vec<MoqtObject> = self
            .objects
            .range(start..=end)
            .map(|(_, object)| object.clone())
            .collect();

        let missing_prefix = self.evicted_up_to.and_then(|evicted| {
            if evicted >= start {
                Some((start, evicted.min(end)))
            } else {
                None
            }
        });

        FetchSlice::new(objects, missing_prefix, self.objects.keys().next().copied())
    }

    /// Closes every subscription's queue, used when the track itself goes
    /// away.
    pub fn close_all(&mut self, reason: CloseReason) {
        for (_, queue) in self.queues.drain() {
            queue.close(reason);
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.queues.len()
    }

    fn enforce_bound(&mut self) {
        let mut evicted_range: Option<(Location, Location)> = None;
        while self.objects.len() > self.bound {
            if let Some((location, _)) = self.objects.pop_first() {
                evicted_range = Some(match evicted_range {
                    Some((from, _)) => (from, location),
                    None => (location, location),
                });
                self.evicted_up_to = Some(location);
            }
        }

        if let Some((from, to)) = evicted_range {
            let gap = GapNotice::new(from, to);
            for (subscribe_id, queue) in &self.queues {
                let wants_range = self
                    .windows
                    .get(*subscribe_id)
                    .map_or(false, |s| s.window().start() <= to);
                if wants_range {
                    queue.enqueue_gap(gap);
                }
            }
        }
    }

    /// Ends bounded windows whose last location was just delivered or that
    /// the track progressed past without publishing their exact end.
    fn close_finished_windows(&mut self, location: Location) {
        let finished: Vec<SubscribeId> = self
            .queues
            .keys()
            .copied()
            .filter(|subscribe_id| match self.windows.get(*subscribe_id) {
                Some(subscription) => {
                    subscription.is_window_end(location)
                        || subscription.window().ends_before(location)
                }
                None => true,
            })
            .collect();

        for subscribe_id in finished {
            if let Some(queue) = self.queues.remove(&subscribe_id) {
                queue.close(CloseReason::SubscriptionEnded);
            }
            self.windows.remove(subscribe_id);
        }
    }
}
