use crate::{
    errors::RelayError,
    models::{
        location::Location,
        subscriptions::{SubscribeId, Subscription},
    },
};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-track aggregation of active subscriptions, answering "which
/// subscriptions want this location" for every incoming object.
///
/// Subscriptions are kept sorted by window start so a lookup only scans
/// windows that could contain the location. Bounded windows the track has
/// progressed past are marked expired during lookups and swept on the next
/// mutation instead of being scanned out eagerly on every publish.
#[derive(Debug, Default)]
pub struct SubscribeWindowSet {
    by_start: BTreeMap<(Location, SubscribeId), Subscription>,
    starts: HashMap<SubscribeId, Location>,
    expired: HashSet<SubscribeId>,
}

impl SubscribeWindowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) -> Result<(), RelayError> {
        self.sweep_expired();

        let subscribe_id = subscription.subscribe_id();
        if self.starts.contains_key(&subscribe_id) {
            return Err(RelayError::DuplicateSubscription(subscribe_id));
        }

        let start = subscription.window().start();
        self.starts.insert(subscribe_id, start);
        self.by_start.insert((start, subscribe_id), subscription);

        Ok(())
    }

    /// Idempotent: removing an unknown id is a no-op.
    pub fn remove(&mut self, subscribe_id: SubscribeId) {
        self.sweep_expired();

        if let Some(start) = self.starts.remove(&subscribe_id) {
            self.by_start.remove(&(start, subscribe_id));
        }
        self.expired.remove(&subscribe_id);
    }

    pub fn get(&self, subscribe_id: SubscribeId) -> Option<&Subscription> {
        let start = self.starts.get(&subscribe_id)?;
        self.by_start.get(&(*start, subscribe_id))
    }

    /// All subscriptions whose window contains `location`. Finite and
    /// restartable per call.
    pub fn interested(&mut self, location: Location) -> impl Iterator<Item = &Subscription> {
        // Only windows starting at or before the location can match.
        let upper = (location, SubscribeId::MAX);

        for ((_, subscribe_id), subscription) in self.by_start.range(..=upper) {
            if subscription.window().ends_before(location) {
                self.expired.insert(*subscribe_id);
            }
        }

        let expired = &self.expired;
        self.by_start
            .range(..=upper)
            .map(|(_, subscription)| subscription)
            .filter(move |subscription| {
                !expired.contains(&subscription.subscribe_id())
                    && subscription.is_interested(location)
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.by_start
            .values()
            .filter(|subscription| !self.expired.contains(&subscription.subscribe_id()))
    }

    pub fn len(&self) -> usize {
        self.by_start.len() - self.expired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep_expired(&mut self) {
        for subscribe_id in self.expired.drain() {
            if let Some(start) = self.starts.remove(&subscribe_id) {
                self.by_start.remove(&(start, subscribe_id));
            }
        }
    }
}


#[cfg(test)]
mod failure {
    use crate::{
        errors::RelayError,
        models::{location::Location, subscriptions::test_helper_fn},
        subscribe_windows::SubscribeWindowSet,
    };

    #[test]
    fn duplicate_subscribe_id() {
        let mut windows = SubscribeWindowSet::new();
        windows
            .add(test_helper_fn::open_ended_subscription(1, Location::new(0, 0)))
            .unwrap();

        let result =
            windows.add(test_helper_fn::open_ended_subscription(1, Location::new(5, 0)));

        assert_eq!(result, Err(RelayError::DuplicateSubscription(1)));
    }
}
