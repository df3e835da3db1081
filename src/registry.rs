//! Shared subscription registry and the dispatch/filter algorithm
//!
//! A single mutex guards the whole registry; coarser contention is
//! accepted for correctness simplicity. Dispatch snapshots matching
//! records under the lock and invokes handlers only after releasing it,
//! so a handler can re-enter the bus without deadlocking.

use crate::queue::EventQueue;
use crate::types::{AnyObject, BusCounts, ObjectId, WeakObject};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Unique identity of one subscription
pub(crate) type TokenId = Uuid;

/// Type-erased handler stored by the registry
///
/// The concrete closure downcasts the event back to its typed form and
/// silently skips values of any other type.
pub(crate) type ErasedHandler =
    Arc<dyn Fn(&(dyn Any + Send + Sync), Option<&AnyObject>) + Send + Sync>;

/// One live subscription
pub(crate) struct SubscriptionRecord {
    pub(crate) id: TokenId,
    pub(crate) type_name: &'static str,
    pub(crate) handler: ErasedHandler,
    pub(crate) filter: Option<WeakObject>,
    pub(crate) subscriber: Option<WeakObject>,
    pub(crate) queue: Option<Arc<dyn EventQueue>>,
}

impl SubscriptionRecord {
    /// Liveness of the weak references this record depends on
    ///
    /// A record whose filter or subscriber has been dropped must never
    /// fire again; it is pruned on the next dispatch of its event type.
    fn is_live(&self) -> bool {
        self.filter.as_ref().map_or(true, WeakObject::is_alive)
            && self.subscriber.as_ref().map_or(true, WeakObject::is_alive)
    }

    /// Whether this record fires for a post addressed to `posted`
    ///
    /// No filter means wildcard: the record fires for every post of its
    /// event type. A filtered record fires only when the post carries the
    /// identical object; it never fires for unaddressed posts.
    fn matches(&self, posted: Option<ObjectId>) -> bool {
        match &self.filter {
            None => true,
            Some(filter) => posted == Some(filter.id()),
        }
    }

    /// Whether this record is tied to `identity` as subscriber or filter
    fn belongs_to(&self, identity: ObjectId) -> bool {
        self.subscriber.as_ref().is_some_and(|s| s.id() == identity)
            || self.filter.as_ref().is_some_and(|f| f.id() == identity)
    }
}

/// Thread-safe mapping from event type to its live subscriptions
///
/// Lifecycle is the owning bus's lifecycle; the global bus never tears
/// its registry down.
#[derive(Default)]
pub(crate) struct Registry {
    buckets: Mutex<HashMap<TypeId, Vec<SubscriptionRecord>>>,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, HashMap<TypeId, Vec<SubscriptionRecord>>> {
        self.buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a record under its event type; never fails
    pub(crate) fn insert(&self, event_type: TypeId, record: SubscriptionRecord) {
        tracing::debug!(
            token = %record.id,
            event_type = record.type_name,
            scoped = record.filter.is_some(),
            queued = record.queue.is_some(),
            "Subscription registered"
        );
        self.lock().entry(event_type).or_default().push(record);
    }

    /// Remove the record with the given token; no-op if already gone
    pub(crate) fn remove_token(&self, event_type: TypeId, id: TokenId) {
        let mut buckets = self.lock();
        if let Some(records) = buckets.get_mut(&event_type) {
            let before = records.len();
            records.retain(|record| record.id != id);
            if records.len() < before {
                tracing::debug!(token = %id, "Subscription disposed");
            }
            if records.is_empty() {
                buckets.remove(&event_type);
            }
        }
    }

    /// Remove every record under `event_type` tied to `identity`
    ///
    /// With `object` set, only records whose filter matches that object
    /// identity as well. No-op if nothing matches.
    pub(crate) fn remove_matching(
        &self,
        event_type: TypeId,
        identity: ObjectId,
        object: Option<ObjectId>,
    ) {
        let mut buckets = self.lock();
        if let Some(records) = buckets.get_mut(&event_type) {
            records.retain(|record| {
                let matched = record.belongs_to(identity)
                    && object.map_or(true, |oid| {
                        record.filter.as_ref().is_some_and(|f| f.id() == oid)
                    });
                !matched
            });
            if records.is_empty() {
                buckets.remove(&event_type);
            }
        }
    }

    /// Remove every record across all buckets tied to `identity`
    pub(crate) fn remove_identity(&self, identity: ObjectId) {
        let mut buckets = self.lock();
        for records in buckets.values_mut() {
            records.retain(|record| !record.belongs_to(identity));
        }
        buckets.retain(|_, records| !records.is_empty());
    }

    /// Dispatch an event to every live matching subscription
    ///
    /// Under the lock: prune records with dead references, select the
    /// records whose filter matches, and copy out their handlers. After
    /// releasing the lock: run each handler inline or submit it to its
    /// target queue. Delivery is at-most-once per live record.
    pub(crate) fn dispatch(
        &self,
        event_type: TypeId,
        type_name: &'static str,
        event: Arc<dyn Any + Send + Sync>,
        object: Option<AnyObject>,
    ) {
        let posted = object.as_ref().map(ObjectId::of);

        let selected: Vec<(ErasedHandler, Option<Arc<dyn EventQueue>>)> = {
            let mut buckets = self.lock();
            let Some(records) = buckets.get_mut(&event_type) else {
                return;
            };

            records.retain(|record| {
                let live = record.is_live();
                if !live {
                    tracing::debug!(
                        token = %record.id,
                        event_type = record.type_name,
                        "Pruned subscription with dead reference"
                    );
                }
                live
            });

            records
                .iter()
                .filter(|record| record.matches(posted))
                .map(|record| (Arc::clone(&record.handler), record.queue.clone()))
                .collect()
        };

        tracing::trace!(
            event_type = type_name,
            addressed = posted.is_some(),
            matched = selected.len(),
            "Dispatching event"
        );

        for (handler, queue) in selected {
            match queue {
                None => handler(event.as_ref(), object.as_ref()),
                Some(queue) => {
                    let event = Arc::clone(&event);
                    let object = object.clone();
                    queue.execute(Box::new(move || handler(event.as_ref(), object.as_ref())));
                }
            }
        }
    }

    /// Live subscription counts grouped by event type
    pub(crate) fn counts(&self) -> BusCounts {
        let buckets = self.lock();
        let mut counts = BusCounts::default();
        for records in buckets.values() {
            for record in records {
                *counts.event_types.entry(record.type_name).or_insert(0) += 1;
                counts.total += 1;
            }
        }
        counts
    }
}
