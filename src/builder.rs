//! Fluent subscription construction
//!
//! A builder is plain configuration state scoped to one event type; it
//! carries no thread affinity and touches the registry only when
//! finalized with [`on_event`].
//!
//! [`on_event`]: SubscriberBuilder::on_event

use crate::queue::EventQueue;
use crate::registry::{ErasedHandler, Registry, SubscriptionRecord};
use crate::token::EventToken;
use crate::types::{AnyObject, Event, WeakObject};
use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Step-wise configurator for one subscription
///
/// Obtained from [`EventBus::subscribe`]. Configure with [`on_queue`]
/// and [`for_object`], then finalize with [`on_event`] to get the
/// subscription's [`EventToken`].
///
/// [`EventBus::subscribe`]: crate::EventBus::subscribe
/// [`on_queue`]: SubscriberBuilder::on_queue
/// [`for_object`]: SubscriberBuilder::for_object
/// [`on_event`]: SubscriberBuilder::on_event
pub struct SubscriberBuilder<'bus, E: Event> {
    registry: &'bus Arc<Registry>,
    filter: Option<WeakObject>,
    queue: Option<Arc<dyn EventQueue>>,
    _event: PhantomData<fn(&E)>,
}

impl<'bus, E: Event> SubscriberBuilder<'bus, E> {
    pub(crate) fn new(registry: &'bus Arc<Registry>) -> Self {
        Self {
            registry,
            filter: None,
            queue: None,
            _event: PhantomData,
        }
    }

    /// Route matching handler invocations to `queue`
    ///
    /// Without a queue the handler runs inline on the posting thread,
    /// before `post` returns.
    pub fn on_queue(mut self, queue: Arc<dyn EventQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Only fire for posts addressed to exactly this `object`
    ///
    /// Identity comparison, never value equality. The object is held
    /// weakly; once it drops the subscription goes quiet and is pruned
    /// on a later dispatch of this event type.
    pub fn for_object<T: Send + Sync + 'static>(mut self, object: &Arc<T>) -> Self {
        self.filter = Some(WeakObject::new(object));
        self
    }

    /// Register the accumulated configuration with `handler`
    ///
    /// Each call registers a distinct subscription: finalizing the same
    /// builder twice means the handler is delivered twice per post.
    pub fn on_event<F>(&self, handler: F) -> EventToken
    where
        F: Fn(&E, Option<&AnyObject>) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        let erased: ErasedHandler = Arc::new(move |event, object| {
            if let Some(event) = event.downcast_ref::<E>() {
                handler(event, object);
            }
        });

        self.registry.insert(
            TypeId::of::<E>(),
            SubscriptionRecord {
                id,
                type_name: std::any::type_name::<E>(),
                handler: erased,
                filter: self.filter.clone(),
                subscriber: None,
                queue: self.queue.clone(),
            },
        );

        EventToken::new(id, TypeId::of::<E>(), self.registry)
    }
}
