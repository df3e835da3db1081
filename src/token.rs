//! Subscription lifecycle handles
//!
//! An `EventToken` identifies one live subscription and disposes it
//! exactly once. A `TokenBag` aggregates tokens so a subscriber can tear
//! down all of its subscriptions together; dropping the bag disposes
//! every member, tying subscription lifetime to the owner's lifetime.

use crate::registry::{Registry, TokenId};
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Disposable handle for one live subscription
///
/// Disposal is idempotent: the first call removes the subscription from
/// the registry, later calls are no-ops. Dropping a token without
/// disposing it leaves the subscription live.
pub struct EventToken {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    id: TokenId,
    event_type: TypeId,
    registry: Weak<Registry>,
    disposed: AtomicBool,
}

impl EventToken {
    pub(crate) fn new(id: TokenId, event_type: TypeId, registry: &Arc<Registry>) -> Self {
        Self {
            inner: Arc::new(TokenInner {
                id,
                event_type,
                registry: Arc::downgrade(registry),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Remove the subscription from the registry
    ///
    /// An already-submitted queued invocation cannot be recalled; dispose
    /// only stops future delivery.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.inner.registry.upgrade() {
            registry.remove_token(self.inner.event_type, self.inner.id);
        }
    }

    /// Whether `dispose` has been called
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Hand the token to a bag that will dispose it with the others
    ///
    /// Moves the token, so a token can only ever belong to one bag.
    pub fn disposed_by(self, bag: &TokenBag) {
        bag.add(self);
    }
}

impl fmt::Debug for EventToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventToken")
            .field("id", &self.inner.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Aggregate disposer for a group of tokens
///
/// Owned by exactly one holder, typically the subscriber whose
/// registrations the tokens represent. Dropping the bag disposes every
/// member, so embedding a bag in a subscriber struct gives automatic
/// teardown when the subscriber goes away.
#[derive(Default)]
pub struct TokenBag {
    tokens: Mutex<Vec<EventToken>>,
}

impl TokenBag {
    /// Empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token; it will be disposed together with the bag
    pub fn add(&self, token: EventToken) {
        self.lock().push(token);
    }

    /// Number of tokens currently held
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the bag holds no tokens
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Dispose every held token and empty the bag
    ///
    /// Each member is disposed exactly once, in no particular order.
    /// Irreversible for the disposed tokens; the bag itself stays usable
    /// and can collect new tokens afterwards.
    pub fn dispose(&self) {
        // Drain before disposing so the registry lock is never taken
        // while the bag lock is held.
        let drained: Vec<EventToken> = self.lock().drain(..).collect();
        for token in &drained {
            token.dispose();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EventToken>> {
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for TokenBag {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for TokenBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBag").field("len", &self.len()).finish()
    }
}
