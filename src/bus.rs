//! Event bus facade
//!
//! Thin coordination layer over the registry. `EventBus::new` builds an
//! isolated instance meant to be injected at composition boundaries so
//! tests get a private bus; `EventBus::global` is the shared
//! process-wide bus, created on first use and never torn down.

use crate::builder::SubscriberBuilder;
use crate::queue::EventQueue;
use crate::registry::{ErasedHandler, Registry, SubscriptionRecord};
use crate::types::{AnyObject, BusCounts, Event, ObjectId, WeakObject};
use std::any::TypeId;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// In-process typed publish-subscribe bus
///
/// Producers post typed events; consumers subscribe per event type,
/// optionally scoped to an object identity and optionally routed to a
/// target queue. Posting is fire-and-forget: producers never learn how
/// many subscribers ran.
pub struct EventBus {
    registry: Arc<Registry>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Isolated bus instance
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::default()),
        }
    }

    /// Shared process-wide bus
    pub fn global() -> &'static EventBus {
        static GLOBAL: OnceLock<EventBus> = OnceLock::new();
        GLOBAL.get_or_init(EventBus::new)
    }

    /// Start building a subscription for events of type `E`
    ///
    /// The canonical registration path; see [`SubscriberBuilder`].
    pub fn subscribe<E: Event>(&self) -> SubscriberBuilder<'_, E> {
        SubscriberBuilder::new(&self.registry)
    }

    /// Register a bound method of `subscriber` for events of type `E`
    ///
    /// Compatibility form for non-closure consumers; semantically the
    /// builder form with the subscriber as implicit receiver. The
    /// subscriber is held weakly: once it drops, the registration goes
    /// quiet and is pruned on a later dispatch. Remove it explicitly
    /// with [`unregister`] or [`unregister_all`].
    ///
    /// [`unregister`]: EventBus::unregister
    /// [`unregister_all`]: EventBus::unregister_all
    pub fn register<E, S>(&self, subscriber: &Arc<S>, method: fn(&S, &E))
    where
        E: Event,
        S: Send + Sync + 'static,
    {
        let weak = Arc::downgrade(subscriber);
        self.insert_bound::<E, _>(
            WeakObject::new(subscriber),
            None,
            None,
            move |event, _object| {
                if let Some(subscriber) = weak.upgrade() {
                    method(&subscriber, event);
                }
            },
        );
    }

    /// Register a bound method with object scoping and queue routing
    ///
    /// Full compatibility form: `object` scopes delivery by identity,
    /// `queue` routes the invocation off the posting thread. Either may
    /// be `None`.
    pub fn register_scoped<E, S>(
        &self,
        subscriber: &Arc<S>,
        method: fn(&S, &E, Option<&AnyObject>),
        object: Option<&AnyObject>,
        queue: Option<Arc<dyn EventQueue>>,
    ) where
        E: Event,
        S: Send + Sync + 'static,
    {
        let weak = Arc::downgrade(subscriber);
        self.insert_bound::<E, _>(
            WeakObject::new(subscriber),
            object.map(WeakObject::erased),
            queue,
            move |event, object| {
                if let Some(subscriber) = weak.upgrade() {
                    method(&subscriber, event, object);
                }
            },
        );
    }

    /// Remove every registration of `subscriber` for events of type `E`
    ///
    /// No-op if none exist. Matches legacy subscriber identity as well
    /// as builder subscriptions scoped with `for_object(subscriber)`.
    pub fn unregister<E, S>(&self, subscriber: &Arc<S>)
    where
        E: Event,
        S: Send + Sync + 'static,
    {
        self.registry
            .remove_matching(TypeId::of::<E>(), ObjectId::of(subscriber), None);
    }

    /// Remove registrations of `subscriber` for `E` scoped to `object`
    pub fn unregister_object<E, S, O>(&self, subscriber: &Arc<S>, object: &Arc<O>)
    where
        E: Event,
        S: Send + Sync + 'static,
        O: Send + Sync + 'static,
    {
        self.registry.remove_matching(
            TypeId::of::<E>(),
            ObjectId::of(subscriber),
            Some(ObjectId::of(object)),
        );
    }

    /// Remove every registration tied to `subscriber` across all event types
    ///
    /// Wholesale teardown by identity: matches both legacy subscriber
    /// identity and builder subscriptions scoped to the same object.
    pub fn unregister_all<S: Send + Sync + 'static>(&self, subscriber: &Arc<S>) {
        self.registry.remove_identity(ObjectId::of(subscriber));
    }

    /// Post `event` to every live matching subscription
    ///
    /// Unaddressed: wildcard subscriptions fire, object-scoped ones do
    /// not. Inline handlers run on this thread before `post` returns;
    /// queued handlers are submitted and not awaited.
    pub fn post<E: Event>(&self, event: E) {
        self.registry.dispatch(
            TypeId::of::<E>(),
            std::any::type_name::<E>(),
            Arc::new(event),
            None,
        );
    }

    /// Post `event` addressed to `object`
    ///
    /// Wildcard subscriptions still fire; scoped subscriptions fire only
    /// when `object` is the identical instance they were built with.
    pub fn post_to<E, O>(&self, event: E, object: &Arc<O>)
    where
        E: Event,
        O: Send + Sync + 'static,
    {
        let erased: AnyObject = object.clone();
        self.registry.dispatch(
            TypeId::of::<E>(),
            std::any::type_name::<E>(),
            Arc::new(event),
            Some(erased),
        );
    }

    /// Live subscription counts grouped by event type
    pub fn counts(&self) -> BusCounts {
        self.registry.counts()
    }

    fn insert_bound<E, F>(
        &self,
        subscriber: WeakObject,
        filter: Option<WeakObject>,
        queue: Option<Arc<dyn EventQueue>>,
        handler: F,
    ) where
        E: Event,
        F: Fn(&E, Option<&AnyObject>) + Send + Sync + 'static,
    {
        let erased: ErasedHandler = Arc::new(move |event, object| {
            if let Some(event) = event.downcast_ref::<E>() {
                handler(event, object);
            }
        });
        self.registry.insert(
            TypeId::of::<E>(),
            SubscriptionRecord {
                id: Uuid::new_v4(),
                type_name: std::any::type_name::<E>(),
                handler: erased,
                filter,
                subscriber: Some(subscriber),
                queue,
            },
        );
    }
}
