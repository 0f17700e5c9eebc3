//! Nestable Core Runtime
//!
//! This crate provides the foundational primitives for nestable containers:
//!
//! - **Reactive Signals**: Fine-grained reactivity without VDOM overhead
//! - **Shared Values**: Cells that notify readers without forcing a rebuild
//! - **Context State**: Keyed state that survives rebuilds, plus scoped
//!   context values pushed by providers
//! - **Event Dispatch**: Scroll, layout and content-size events from the host
//!
//! # Example
//!
//! ```rust
//! use nestable_core::reactive::ReactiveGraph;
//!
//! let mut graph = ReactiveGraph::new();
//!
//! // Create a signal
//! let count = graph.create_signal(0i32);
//!
//! // Create a derived value
//! let doubled = graph.create_derived(move |g| {
//!     g.get(count).unwrap_or(0) * 2
//! });
//!
//! // Create an effect
//! let _effect = graph.create_effect(move |g| {
//!     println!("Count is now: {:?}", g.get(count));
//! });
//!
//! // Update the signal
//! graph.set(count, 5);
//! assert_eq!(graph.get_derived(doubled), Some(10));
//! ```

pub mod context_state;
pub mod error;
pub mod events;
pub mod geometry;
pub mod reactive;

pub use context_state::{
    ContextState, DirtyFlag, HookState, SharedHookState, SharedReactiveGraph, StateKey,
};
pub use error::ContextError;
pub use events::{Event, EventData, EventDispatcher, EventType, LayoutEvent, ScrollEvent};
pub use geometry::{Point, Rect, Size};
pub use reactive::{
    Derived, DerivedId, Effect, EffectId, ReactiveGraph, SharedValue, Signal, SignalId, State,
};
