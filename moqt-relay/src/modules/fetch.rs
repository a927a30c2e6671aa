use crate::modules::live_relay_queue::wrapper::LiveRelayQueueWrapper;
use async_trait::async_trait;
use moqt_core::{
    errors::RelayError,
    models::{
        location::Location,
        object::MoqtObject,
        tracks::{DeliveryOrder, FullTrackName},
    },
};
use std::sync::Arc;

/// Durable object storage backing fetches that reach behind the live
/// buffer. Results come back in ascending location order.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn read(
        &self,
        track: &FullTrackName,
        start: Location,
        end: Location,
    ) -> Result<Vec<MoqtObject>, RelayError>;
}

/// Serves historical ranges: the live buffer first, the object store for
/// whatever was already evicted.
#[derive(Clone)]
pub struct FetchEngine {
    relay_queue: LiveRelayQueueWrapper,
    store: Option<Arc<dyn ObjectStore>>,
}

impl FetchEngine {
    pub fn new(relay_queue: LiveRelayQueueWrapper, store: Option<Arc<dyn ObjectStore>>) -> Self {
        Self { relay_queue, store }
    }

    /// All known objects in `[start, end]`, ordered per `delivery_order`.
    ///
    /// When the front of the range was evicted and no store is configured,
    /// the fetch fails with the earliest location that is still available.
    pub async fn fetch(
        &self,
        track: FullTrackName,
        start: Location,
        end: Location,
        delivery_order: DeliveryOrder,
    ) -> Result<Vec<MoqtObject>, RelayError> {
        if end < start {
            return Err(RelayError::ProtocolViolation(format!(
                "fetch end ({:?}) precedes start ({:?})",
                end, start
            )));
        }

        let slice = self
            .relay_queue
            .fetch_range(track.clone(), start, end)
            .await?;

        let mut objects = match slice.missing_prefix() {
            Some((missing_from, missing_to)) => match &self.store {
                Some(store) => {
                    let mut stored = store.read(&track, missing_from, missing_to).await?;
                    stored.extend(slice.into_objects());
                    stored
                }
                None => {
                    return Err(RelayError::RangeUnavailable {
                        available_from: slice.available_from(),
                    });
                }
            },
            None => slice.into_objects(),
        };

        if delivery_order == DeliveryOrder::Descending {
            objects.reverse();
        }

        Ok(objects)
    }
}
