use crate::store::{denormalize, ChangedKeys, Denormalized, Footprint, Store};
use micrograph::{utils::notify_isolated, Query, Variables};
use parking_lot::Mutex;
use serde_json::Value;
use stable_vec::StableVec;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Weak
};

pub(crate) type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

pub(crate) struct Subscription {
    pub(crate) query: Query,
    pub(crate) variables: Variables,
    pub(crate) callback: Callback,
    pub(crate) footprint: Footprint,
    pub(crate) active: Arc<AtomicBool>
}

/// A callback that's due to run once the state lock is released.
pub(crate) struct Delivery {
    callback: Callback,
    active: Arc<AtomicBool>,
    data: Value
}

impl Delivery {
    pub(crate) fn new(callback: Callback, active: Arc<AtomicBool>, data: Value) -> Self {
        Delivery {
            callback,
            active,
            data
        }
    }
}

/// Run callbacks in order. A callback unsubscribed by an earlier one in the same batch is
/// skipped, and a panicking callback doesn't stop the rest.
pub(crate) fn deliver(deliveries: Vec<Delivery>) {
    if !deliveries.is_empty() {
        tracing::trace!(count = deliveries.len(), "notifying cache subscribers");
    }
    for delivery in deliveries {
        if delivery.active.load(Ordering::SeqCst) {
            let Delivery { callback, data, .. } = delivery;
            notify_isolated(|| callback(&data));
        }
    }
}

pub(crate) struct CacheState {
    pub(crate) store: Store,
    pub(crate) subscriptions: StableVec<Subscription>
}

impl CacheState {
    pub(crate) fn new() -> Self {
        CacheState {
            store: Store::new(),
            subscriptions: StableVec::new()
        }
    }

    /// Recompute the subscriptions a write may have affected and collect the ones that now
    /// have data.
    ///
    /// A subscription is recomputed if its footprint overlaps `changed`, or if it read fewer
    /// than `eager_refresh_threshold` slots last time and so can't rule the write out.
    pub(crate) fn refresh(
        &mut self,
        changed: &ChangedKeys,
        eager_refresh_threshold: usize
    ) -> Vec<Delivery> {
        let CacheState {
            store,
            subscriptions
        } = self;

        let mut deliveries = Vec::new();
        for subscription in subscriptions.values_mut() {
            if !subscription.active.load(Ordering::SeqCst) {
                continue;
            }
            if subscription.footprint.len() >= eager_refresh_threshold
                && subscription.footprint.is_disjoint(changed)
            {
                continue;
            }

            let Denormalized { data, footprint } =
                denormalize(&subscription.query, &subscription.variables, store);
            subscription.footprint = footprint;
            if let Some(data) = data {
                deliveries.push(Delivery::new(
                    subscription.callback.clone(),
                    subscription.active.clone(),
                    data
                ));
            }
        }
        deliveries
    }
}

/// Returned by [`NormalizedCache::subscribe`](struct.NormalizedCache.html#method.subscribe).
///
/// Dropping it does not unsubscribe.
pub struct Unsubscribe {
    state: Weak<Mutex<CacheState>>,
    index: usize,
    active: Arc<AtomicBool>
}

impl Unsubscribe {
    pub(crate) fn new(
        state: Weak<Mutex<CacheState>>,
        index: usize,
        active: Arc<AtomicBool>
    ) -> Self {
        Unsubscribe {
            state,
            index,
            active
        }
    }

    /// Stop the callback from being called again. Calling this more than once, from inside a
    /// callback or after the cache is gone is fine.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(state) = self.state.upgrade() {
            let mut state = state.lock();
            state.subscriptions.remove(self.index);
            // removed slots stay behind as tombstones until the vec is replaced
            if state.subscriptions.num_elements() == 0 {
                state.subscriptions = StableVec::new();
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use crate::NormalizedCache;
    use micrograph::{Query, Variables};

    #[test]
    fn reuses_slots_once_every_subscriber_is_gone() {
        let cache = NormalizedCache::new();
        let query = Query::parse("{ film { title } }").unwrap();
        let variables = Variables::new();

        for _ in 0..3 {
            let first = cache.subscribe(&query, &variables, |_| {});
            let second = cache.subscribe(&query, &variables, |_| {});
            assert_eq!((first.index, second.index), (0, 1));

            second.unsubscribe();
            first.unsubscribe();
            assert_eq!(cache.subscription_count(), 0);
        }
    }

    #[test]
    fn keeps_live_subscribers_while_others_leave() {
        let cache = NormalizedCache::new();
        let query = Query::parse("{ film { title } }").unwrap();
        let variables = Variables::new();

        let first = cache.subscribe(&query, &variables, |_| {});
        let second = cache.subscribe(&query, &variables, |_| {});
        first.unsubscribe();

        let third = cache.subscribe(&query, &variables, |_| {});
        assert_eq!(third.index, 2);
        assert_eq!(cache.subscription_count(), 2);

        second.unsubscribe();
        third.unsubscribe();
        assert_eq!(cache.subscription_count(), 0);
    }
}
