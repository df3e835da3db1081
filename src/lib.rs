//! # typebus
//!
//! Typed, in-process publish-subscribe bus with scoped delivery, queue
//! routing, and disposable subscription tokens.
//!
//! ## Overview
//!
//! Producers post typed events; consumers register interest in an event
//! type and receive matching events, optionally filtered by an associated
//! object identity and optionally delivered on a designated execution
//! queue instead of the posting thread. Subscriptions are torn down
//! through disposable tokens, individually or in bulk via a token bag
//! tied to the subscriber's lifetime.
//!
//! ## Quick Start
//!
//! ```rust
//! use typebus::{Event, EventBus};
//!
//! struct CountEvent {
//!     count: u32,
//! }
//!
//! impl Event for CountEvent {}
//!
//! let bus = EventBus::new();
//!
//! // Subscribe, then post — the handler runs inline on this thread.
//! let token = bus.subscribe::<CountEvent>().on_event(|event, _object| {
//!     println!("count = {}", event.count);
//! });
//!
//! bus.post(CountEvent { count: 5 });
//!
//! // Disposing the token stops future delivery.
//! token.dispose();
//! bus.post(CountEvent { count: 6 });
//! ```
//!
//! ## Architecture
//!
//! - **`EventBus`** — facade over the shared registry; `new()` for
//!   injectable instances, `global()` for the process-wide bus
//! - **`SubscriberBuilder`** — fluent configuration of one subscription
//! - **`EventToken` / `TokenBag`** — subscription lifecycle handles
//! - **`EventQueue`** — target execution context for routed handlers
//!
//! ## Delivery semantics
//!
//! At-most-once per live subscription per post. Handlers without a queue
//! run synchronously on the posting thread; handlers with a queue are
//! submitted fire-and-forget. Object scoping compares identity, never
//! value equality, and an object-scoped subscription never fires for an
//! unaddressed post.

pub mod builder;
pub mod bus;
pub mod error;
pub mod queue;
pub mod token;
pub mod types;

mod registry;

// Re-export core types
pub use builder::SubscriberBuilder;
pub use bus::EventBus;
pub use error::{BusError, Result};
pub use queue::{EventQueue, Job, SerialQueue, TokioQueue};
pub use token::{EventToken, TokenBag};
pub use types::{any_object, AnyObject, BusCounts, Event, ObjectId, WeakObject};
