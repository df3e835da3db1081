//! Core types for the typebus system
//!
//! Defines the event capability the bus dispatches on, the opaque object
//! identity used to scope delivery, and the weak object handle the
//! registry stores so it never keeps a filter object alive.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Capability marker for values that can travel through the bus
///
/// The registry keys subscriptions on the implementor's `TypeId`, never
/// on the value itself. Events are immutable; a posted event is owned by
/// the post call and shared read-only with every matching handler.
///
/// ```rust
/// use typebus::Event;
///
/// struct CountEvent {
///     pub count: u32,
/// }
///
/// impl Event for CountEvent {}
/// ```
pub trait Event: Any + Send + Sync + 'static {}

/// Type-erased shared object used for scoped posting and filtering
///
/// Identity is the `Arc` allocation, so the same object observed through
/// different `Arc` clones compares equal, and structurally identical
/// values in different allocations do not.
pub type AnyObject = Arc<dyn Any + Send + Sync>;

/// Erase a concrete `Arc` into an [`AnyObject`] without losing identity
pub fn any_object<T: Send + Sync + 'static>(object: &Arc<T>) -> AnyObject {
    object.clone()
}

/// Opaque identity handle for an `Arc`-held object
///
/// Compared by identity (allocation address), never by value equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Identity of the object behind `object`
    pub fn of<T: ?Sized>(object: &Arc<T>) -> Self {
        ObjectId(Arc::as_ptr(object) as *const () as usize)
    }
}

/// Weak handle to a filter or subscriber object
///
/// Captures the identity at registration time so matching keeps working
/// while the object is alive; liveness is probed at dispatch time. The
/// registry never extends the referent's lifetime.
#[derive(Clone)]
pub struct WeakObject {
    weak: Weak<dyn Any + Send + Sync>,
    id: ObjectId,
}

impl WeakObject {
    /// Weak handle to a concretely typed object
    pub fn new<T: Send + Sync + 'static>(object: &Arc<T>) -> Self {
        let erased: AnyObject = object.clone();
        Self::erased(&erased)
    }

    /// Weak handle to an already-erased object
    pub fn erased(object: &AnyObject) -> Self {
        Self {
            id: ObjectId::of(object),
            weak: Arc::downgrade(object),
        }
    }

    /// Identity captured at registration time
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Whether the referent is still alive
    pub fn is_alive(&self) -> bool {
        self.weak.strong_count() > 0
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObject")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Live subscription counts grouped by event type
#[derive(Debug, Clone, Default)]
pub struct BusCounts {
    /// Counts per event type name
    pub event_types: HashMap<&'static str, usize>,

    /// Total live subscriptions
    pub total: usize,
}
